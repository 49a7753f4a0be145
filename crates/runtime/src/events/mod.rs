//! Event notifications: typed payloads, observer lists, and the topic bus.
//!
//! Observers are synchronous callbacks owned by the emitting service. The bus
//! is an optional broadcast mirror for decoupled consumers. Edge-triggered
//! and level-triggered notifications always go through separate methods.
mod bus;
mod observers;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use observers::{ObserverList, SubscriptionToken, TokenSource};
pub use types::{
    AlertnessChange, AwarenessTransition, DetectionChange, LevelTransition, PerceptionEvent,
    StealthEvent, TierTransition,
};
