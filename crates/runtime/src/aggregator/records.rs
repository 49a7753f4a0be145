//! Per-AI suspicion records and the global alertness accumulator.

use stealth_core::config::{AlertnessConfig, AwarenessThresholds, EvidenceConfig};
use stealth_core::types::EvidenceWindow;
use stealth_core::{AiAwarenessState, AiSuspicionReport, clamp01};

/// What the aggregator remembers about one reporting AI.
#[derive(Clone, Debug, PartialEq)]
pub struct AiRecord {
    pub suspicion01: f32,
    pub awareness: AiAwarenessState,
    pub evidence: EvidenceWindow,
    pub last_report: AiSuspicionReport,
}

impl AiRecord {
    pub fn new(report: AiSuspicionReport) -> Self {
        Self {
            suspicion01: 0.0,
            awareness: AiAwarenessState::Calm,
            evidence: EvidenceWindow::new(),
            last_report: report,
        }
    }

    /// Stores the report and returns the awareness before and after it.
    pub fn apply(
        &mut self,
        report: AiSuspicionReport,
        evidence: &EvidenceConfig,
        thresholds: &AwarenessThresholds,
    ) -> (AiAwarenessState, AiAwarenessState) {
        let old = self.awareness;
        self.suspicion01 = clamp01(report.suspicion01);
        self.evidence
            .record(report.time_seconds, self.suspicion01, evidence);
        self.awareness = AiAwarenessState::from_suspicion(self.suspicion01, thresholds);
        self.last_report = report;
        (old, self.awareness)
    }

    /// Reported suspicion raised by the evidence bonus.
    pub fn effective_suspicion(&self, evidence: &EvidenceConfig) -> f32 {
        clamp01(self.suspicion01 + self.evidence.bonus(evidence))
    }
}

/// Slowly decaying 0..1 summary of recent alerting reports.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alertness {
    value: f32,
    last_raise_at: Option<f64>,
    last_update_at: Option<f64>,
    last_notified: f32,
}

impl Alertness {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn raise(&mut self, weight: f32, now: f64, config: &AlertnessConfig) {
        if !config.enabled {
            return;
        }
        self.decay(now, config);
        let weight = clamp01(weight);
        if weight > 0.0 {
            self.value = self.value.max(weight);
            self.last_raise_at = Some(now);
        }
    }

    /// Linear decay starting `decay_delay_seconds` after the last raise.
    pub fn decay(&mut self, now: f64, config: &AlertnessConfig) {
        let from = match (self.last_update_at, self.last_raise_at) {
            (_, None) | (None, _) => {
                self.last_update_at = Some(now);
                return;
            }
            (Some(updated), Some(raised)) => {
                updated.max(raised + f64::from(config.decay_delay_seconds))
            }
        };
        if now > from && config.enabled {
            let drop = (now - from) as f32 * config.decay_per_second;
            self.value = clamp01(self.value - drop);
        }
        self.last_update_at = Some(self.last_update_at.map_or(now, |t| t.max(now)));
    }

    /// Returns `(old, new)` when the value moved past the change epsilon since
    /// the last notification.
    pub fn take_change(&mut self, config: &AlertnessConfig) -> Option<(f32, f32)> {
        if (self.value - self.last_notified).abs() <= config.change_epsilon {
            return None;
        }
        let old = self.last_notified;
        self.last_notified = self.value;
        Some((old, self.value))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
