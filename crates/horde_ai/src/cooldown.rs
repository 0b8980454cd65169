//! Cooldown-gated ability slots

use crate::timer::{Deferred, TimerQueue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Abilities an agent may own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityId {
    /// Plain melee swing
    #[default]
    Basic,
    /// Telegraphed dash
    Charge,
    /// Area stomp
    Slam,
}

impl AbilityId {
    /// Anything but the basic attack counts as a skill
    pub fn is_special(self) -> bool {
        self != AbilityId::Basic
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbilityId::Basic => "basic",
            AbilityId::Charge => "charge",
            AbilityId::Slam => "slam",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilitySlot {
    pub id: AbilityId,
    pub ready: bool,
    pub cooldown_ms: u64,
    pub in_progress: bool,
}

/// Ready flags for every ability of one agent
#[derive(Debug, Clone, Default)]
pub struct AbilityGate {
    slots: Vec<AbilitySlot>,
}

impl AbilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or redefine) an ability; it starts ready
    pub fn register(&mut self, id: AbilityId, cooldown_ms: u64) {
        let slot = AbilitySlot {
            id,
            ready: true,
            cooldown_ms,
            in_progress: false,
        };
        match self.slot_mut(id) {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
    }

    fn slot(&self, id: AbilityId) -> Option<&AbilitySlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn slot_mut(&mut self, id: AbilityId) -> Option<&mut AbilitySlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    pub fn has(&self, id: AbilityId) -> bool {
        self.slot(id).is_some()
    }

    /// False for abilities the agent does not own
    pub fn is_ready(&self, id: AbilityId) -> bool {
        self.slot(id).is_some_and(|s| s.ready)
    }

    pub fn is_in_progress(&self, id: AbilityId) -> bool {
        self.slot(id).is_some_and(|s| s.in_progress)
    }

    /// Consume the ready flag and schedule its return.
    ///
    /// Returns false (and changes nothing) if the ability is missing or on
    /// cooldown.
    pub fn try_activate(&mut self, id: AbilityId, now_ms: u64, timers: &mut TimerQueue) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if !slot.ready {
            return false;
        }
        slot.ready = false;
        timers.schedule(now_ms, slot.cooldown_ms, Deferred::AbilityReady(id));
        true
    }

    /// Cooldown timer fired
    pub fn mark_ready(&mut self, id: AbilityId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.ready = true;
        }
    }

    pub fn set_in_progress(&mut self, id: AbilityId, in_progress: bool) {
        if let Some(slot) = self.slot_mut(id) {
            slot.in_progress = in_progress;
        }
    }

    /// Any special ability currently running
    pub fn is_using_skill(&self) -> bool {
        self.slots.iter().any(|s| s.id.is_special() && s.in_progress)
    }

    /// Spawn defaults: everything ready, nothing running
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.ready = true;
            slot.in_progress = false;
        }
    }

    pub fn slots(&self) -> &[AbilitySlot] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AbilityGate {
        let mut gate = AbilityGate::new();
        gate.register(AbilityId::Basic, 1_000);
        gate.register(AbilityId::Charge, 4_000);
        gate
    }

    #[test]
    fn test_activation_consumes_ready() {
        let mut gate = gate();
        let mut timers = TimerQueue::new();

        assert!(gate.try_activate(AbilityId::Basic, 0, &mut timers));
        assert!(!gate.is_ready(AbilityId::Basic));
        assert!(!gate.try_activate(AbilityId::Basic, 10, &mut timers));
        assert_eq!(timers.len(), 1);

        let (_, action) = timers.pop_due(1_000).unwrap();
        assert_eq!(action, Deferred::AbilityReady(AbilityId::Basic));
        gate.mark_ready(AbilityId::Basic);
        assert!(gate.is_ready(AbilityId::Basic));
    }

    #[test]
    fn test_abilities_are_independent() {
        let mut gate = gate();
        let mut timers = TimerQueue::new();

        assert!(gate.try_activate(AbilityId::Basic, 0, &mut timers));
        assert!(gate.is_ready(AbilityId::Charge));
        assert!(gate.try_activate(AbilityId::Charge, 0, &mut timers));
        assert!(!gate.is_ready(AbilityId::Basic));
    }

    #[test]
    fn test_missing_ability_never_activates() {
        let mut gate = gate();
        let mut timers = TimerQueue::new();
        assert!(!gate.try_activate(AbilityId::Slam, 0, &mut timers));
        assert!(!gate.is_ready(AbilityId::Slam));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_using_skill_ignores_basic() {
        let mut gate = gate();
        gate.set_in_progress(AbilityId::Basic, true);
        assert!(!gate.is_using_skill());
        gate.set_in_progress(AbilityId::Charge, true);
        assert!(gate.is_using_skill());

        gate.reset();
        assert!(!gate.is_using_skill());
        assert!(gate.slots().iter().all(|s| s.ready && !s.in_progress));
    }
}
