//! # horde_event - Event Delivery
//!
//! Fire-and-forget notification plumbing between the AI runtime and its
//! collaborators (presentation, audio, scoring):
//! - `EventBus`: typed publish/subscribe with priority-ordered handlers
//! - `EventChannel`: single-type queue drained by the consumer
//!
//! Publishing never blocks and never calls back into the publisher. Events
//! are delivered when the owner calls `EventBus::process`.

use crossbeam_channel::{Receiver, Sender};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;

/// Subscriber priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Event envelope containing metadata
pub struct EventEnvelope {
    pub type_id: TypeId,
    pub data: Box<dyn Any + Send + Sync>,
    pub priority: Priority,
    /// `EventBus::frame` at publish time
    pub frame: u64,
}

impl EventEnvelope {
    pub fn new<E: Event>(event: E, priority: Priority, frame: u64) -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            data: Box::new(event),
            priority,
            frame,
        }
    }

    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.data.downcast_ref::<E>()
    }
}

/// Dynamic event handler
type DynamicHandler = Box<dyn Fn(&dyn Any) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Cloneable sending side of an `EventBus`
#[derive(Clone)]
pub struct EventPublisher {
    sender: Sender<EventEnvelope>,
}

impl EventPublisher {
    pub fn publish<E: Event>(&self, event: E) {
        self.publish_with_priority(event, Priority::Normal);
    }

    pub fn publish_with_priority<E: Event>(&self, event: E, priority: Priority) {
        // The bus owns the receiver, so this only fails once the bus is gone
        if self.sender.send(EventEnvelope::new(event, priority, 0)).is_err() {
            log::trace!("event dropped: bus no longer exists");
        }
    }
}

/// Event bus for publishing and subscribing to events
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    handlers: BTreeMap<TypeId, Vec<(SubscriberId, Priority, DynamicHandler)>>,
    next_subscriber_id: u64,
    frame: u64,
    /// Reused between `process` calls
    batch: Vec<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            handlers: BTreeMap::new(),
            next_subscriber_id: 1,
            frame: 0,
            batch: Vec::new(),
        }
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        self.publish_with_priority(event, Priority::Normal);
    }

    /// Publish an event with priority
    pub fn publish_with_priority<E: Event>(&self, event: E, priority: Priority) {
        let envelope = EventEnvelope::new(event, priority, self.frame);
        if self.sender.send(envelope).is_err() {
            log::trace!("event dropped: bus receiver disconnected");
        }
    }

    /// A handle other systems can publish through
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            sender: self.sender.clone(),
        }
    }

    /// Subscribe to an event type
    pub fn subscribe<E: Event, F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority::<E, F>(handler, Priority::Normal)
    }

    /// Subscribe with priority; higher priority handlers run first
    pub fn subscribe_with_priority<E: Event, F>(
        &mut self,
        handler: F,
        priority: Priority,
    ) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;

        let wrapped_handler: DynamicHandler = Box::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                handler(event);
            }
        });

        let handlers = self.handlers.entry(TypeId::of::<E>()).or_default();
        handlers.push((id, priority, wrapped_handler));
        // Stable sort keeps subscription order within a priority
        handlers.sort_by(|a, b| b.1.cmp(&a.1));

        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        for handlers in self.handlers.values_mut() {
            handlers.retain(|(sub_id, _, _)| *sub_id != id);
        }
    }

    /// Deliver all pending events, highest priority first.
    ///
    /// Returns the number of events taken off the queue.
    pub fn process(&mut self) -> usize {
        self.batch.clear();
        self.batch.extend(self.receiver.try_iter());
        self.batch.sort_by(|a, b| b.priority.cmp(&a.priority));

        for envelope in &self.batch {
            if let Some(handlers) = self.handlers.get(&envelope.type_id) {
                for (_, _, handler) in handlers {
                    handler(envelope.data.as_ref());
                }
            }
        }

        self.frame += 1;
        let delivered = self.batch.len();
        self.batch.clear();
        delivered
    }

    /// Drop all pending events without delivering them
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Number of completed `process` calls
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Channel for single-type events
pub struct EventChannel<E: Event> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E: Event> EventChannel<E> {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    pub fn send(&self, event: E) {
        if self.sender.send(event).is_err() {
            log::trace!("event dropped: channel receiver disconnected");
        }
    }

    pub fn receive(&self) -> Option<E> {
        self.receiver.try_recv().ok()
    }

    /// Drain all events into a new vector
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Drain all events into `out`, keeping its allocation
    pub fn drain_into(&self, out: &mut Vec<E>) {
        out.extend(self.receiver.try_iter());
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl<E: Event> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, EventChannel, EventPublisher, Priority, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Killed(u32);

    #[test]
    fn test_event_bus() {
        let mut bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(move |e: &Killed| {
            counter_clone.fetch_add(e.0, Ordering::SeqCst);
        });

        bus.publish(Killed(3));
        bus.publisher().publish(Killed(4));
        assert_eq!(bus.pending_count(), 2);
        assert_eq!(bus.process(), 2);

        assert_eq!(counter.load(Ordering::SeqCst), 7);
        assert!(!bus.has_pending());
        assert_eq!(bus.frame(), 1);
    }

    #[test]
    fn test_publisher_outliving_bus_drops_quietly() {
        let bus = EventBus::new();
        let publisher = bus.publisher();
        drop(bus);

        publisher.publish(Killed(1));
        publisher.publish_with_priority(Killed(2), Priority::Critical);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let id = bus.subscribe(move |_: &Killed| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.unsubscribe(id);
        bus.publish(Killed(1));
        bus.process();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_channel() {
        let channel: EventChannel<Killed> = EventChannel::new();

        channel.send(Killed(1));
        channel.send(Killed(2));
        channel.send(Killed(3));
        assert_eq!(channel.len(), 3);

        let events = channel.drain();
        assert_eq!(events.iter().map(|e| e.0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_priority() {
        let mut bus = EventBus::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();

        bus.subscribe_with_priority(
            move |e: &Killed| {
                order1.lock().push(("low", e.0));
            },
            Priority::Low,
        );

        bus.subscribe_with_priority(
            move |e: &Killed| {
                order2.lock().push(("high", e.0));
            },
            Priority::High,
        );

        bus.publish(Killed(42));
        bus.process();

        let received = order.lock();
        assert_eq!(received[0].0, "high");
        assert_eq!(received[1].0, "low");
    }
}
