//! Lifecycle and state events emitted by agents

use crate::agent::AgentId;
use crate::cooldown::AbilityId;
use crate::species::SpeciesId;
use crate::state_machine::AgentState;
use horde_event::{EventBus, EventChannel};
use horde_math::Vec2;

/// Everything presentation and game logic can observe about an agent
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Spawned {
        agent: AgentId,
        species: SpeciesId,
        position: Vec2,
    },
    StateChanged {
        agent: AgentId,
        from: AgentState,
        to: AgentState,
    },
    AbilityStarted {
        agent: AgentId,
        ability: AbilityId,
    },
    /// Finished or interrupted
    AbilityStopped {
        agent: AgentId,
        ability: AbilityId,
    },
    Enraged {
        agent: AgentId,
    },
    Death {
        agent: AgentId,
        position: Vec2,
        experience: u32,
    },
    /// Returned to its pool
    Released {
        agent: AgentId,
    },
}

impl AgentEvent {
    pub fn agent(&self) -> AgentId {
        match self {
            AgentEvent::Spawned { agent, .. }
            | AgentEvent::StateChanged { agent, .. }
            | AgentEvent::AbilityStarted { agent, .. }
            | AgentEvent::AbilityStopped { agent, .. }
            | AgentEvent::Enraged { agent }
            | AgentEvent::Death { agent, .. }
            | AgentEvent::Released { agent } => *agent,
        }
    }
}

/// Where agents send their events
pub trait EventSink {
    fn emit(&mut self, event: AgentEvent);
}

impl EventSink for Vec<AgentEvent> {
    fn emit(&mut self, event: AgentEvent) {
        self.push(event);
    }
}

impl EventSink for EventChannel<AgentEvent> {
    fn emit(&mut self, event: AgentEvent) {
        self.send(event);
    }
}

/// Queued on the bus; delivered on the next `process()`
impl EventSink for EventBus {
    fn emit(&mut self, event: AgentEvent) {
        self.publish(event);
    }
}

/// Drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: AgentEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn death() -> AgentEvent {
        AgentEvent::Death {
            agent: AgentId::from_raw(4),
            position: Vec2::ZERO,
            experience: 12,
        }
    }

    #[test]
    fn test_channel_sink() {
        let mut channel = EventChannel::<AgentEvent>::new();
        channel.emit(death());
        assert_eq!(channel.drain(), vec![death()]);
    }

    #[test]
    fn test_bus_sink_delivers_on_process() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        bus.subscribe::<AgentEvent, _>(move |event| seen_clone.lock().push(event.agent()));

        bus.emit(death());
        assert!(seen.lock().is_empty());
        bus.process();
        assert_eq!(*seen.lock(), vec![AgentId::from_raw(4)]);
    }
}
