//! Bounded per-AI history of suspicion-raising reports.

use arrayvec::ArrayVec;

use crate::config::EvidenceConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvidenceEvent {
    pub time_seconds: f64,
    pub suspicion01: f32,
}

/// Time- and count-bounded window. Oldest events are evicted first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvidenceWindow {
    events: ArrayVec<EvidenceEvent, { EvidenceWindow::CAPACITY }>,
}

impl EvidenceWindow {
    pub const CAPACITY: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[EvidenceEvent] {
        &self.events
    }

    /// Records a report if it clears the minimum suspicion. Returns whether it counted.
    pub fn record(&mut self, time_seconds: f64, suspicion01: f32, config: &EvidenceConfig) -> bool {
        if !config.enabled || suspicion01 < config.min_event_suspicion {
            return false;
        }
        self.prune(time_seconds, config);

        let limit = config.max_events.clamp(1, Self::CAPACITY);
        while self.events.len() >= limit {
            self.events.remove(0);
        }
        self.events.push(EvidenceEvent {
            time_seconds,
            suspicion01,
        });
        true
    }

    /// Drops events older than the window.
    pub fn prune(&mut self, now: f64, config: &EvidenceConfig) {
        let horizon = now - f64::from(config.window_seconds);
        self.events.retain(|event| event.time_seconds >= horizon);
    }

    /// Suspicion bonus contributed by the events still in the window.
    pub fn bonus(&self, config: &EvidenceConfig) -> f32 {
        if !config.enabled {
            return 0.0;
        }
        (self.events.len() as f32 * config.points_per_event).min(config.max_bonus)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
