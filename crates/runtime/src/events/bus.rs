//! Broadcast fan-out of engine notifications, one channel per topic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{PerceptionEvent, StealthEvent};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Global score, tier, level, detection, awareness, and alertness
    Stealth,
    /// Per-agent perception state and suspicion
    Perception,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Stealth, Topic::Perception];

    const fn index(self) -> usize {
        match self {
            Topic::Stealth => 0,
            Topic::Perception => 1,
        }
    }
}

/// A notification tagged with the topic it travels on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Stealth(StealthEvent),
    Perception(PerceptionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Stealth(_) => Topic::Stealth,
            Event::Perception(_) => Topic::Perception,
        }
    }
}

/// Mirrors the aggregator's and agents' observer notifications for consumers
/// that prefer channels over callbacks.
///
/// Publishing never blocks. A receiver that falls more than the capacity
/// behind loses the oldest events and sees `Lagged` on its next receive.
/// Clones share the same channels.
#[derive(Clone)]
pub struct EventBus {
    senders: Arc<[broadcast::Sender<Event>; 2]>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Capacity applies per topic and is at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            senders: Arc::new(Topic::ALL.map(|_| broadcast::channel(capacity).0)),
        }
    }

    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.senders[topic.index()].send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Receives every event published on `topic` from now on.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.senders[topic.index()].subscribe()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.senders[topic.index()].receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::DetectionChange;

    fn detection(detected: bool) -> Event {
        Event::Stealth(StealthEvent::DetectionChanged(DetectionChange {
            detected,
            source: None,
        }))
    }

    #[test]
    fn events_are_routed_by_topic() {
        let bus = EventBus::new();
        let mut stealth_rx = bus.subscribe(Topic::Stealth);
        let mut perception_rx = bus.clone().subscribe(Topic::Perception);

        bus.publish(detection(true));

        assert!(matches!(
            stealth_rx.try_recv(),
            Ok(Event::Stealth(StealthEvent::DetectionChanged(_)))
        ));
        assert!(perception_rx.try_recv().is_err());
        assert_eq!(bus.subscriber_count(Topic::Stealth), 1);
    }

    #[test]
    fn slow_receivers_lag_instead_of_blocking() {
        let bus = EventBus::with_capacity(0);
        bus.publish(detection(false));

        let mut rx = bus.subscribe(Topic::Stealth);
        bus.publish(detection(true));
        bus.publish(detection(false));
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv(), Ok(detection(false)));
    }
}
