use crate::handle::ActorHandle;
use crate::math::Vec3;

use super::perception::SuspicionReason;

/// Suspicion pushed by one AI to the aggregator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiSuspicionReport {
    /// The reporting AI.
    pub subject: ActorHandle,
    pub suspicion01: f32,
    pub reason: SuspicionReason,
    pub location: Option<Vec3>,
    pub instigator: Option<ActorHandle>,
    pub time_seconds: f64,
}

impl AiSuspicionReport {
    pub fn new(subject: ActorHandle, suspicion01: f32, time_seconds: f64) -> Self {
        Self {
            subject,
            suspicion01,
            reason: SuspicionReason::Generic,
            location: None,
            instigator: None,
            time_seconds,
        }
    }

    pub fn with_reason(mut self, reason: SuspicionReason) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_instigator(mut self, instigator: ActorHandle) -> Self {
        self.instigator = Some(instigator);
        self
    }
}
