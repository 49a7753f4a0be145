//! Per-update trace budget and round-robin target scheduling.

/// Caps the line traces one agent may issue in one update. Zero means
/// unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceBudget {
    max: u32,
    used: u32,
    hit_cap: bool,
}

impl TraceBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            used: 0,
            hit_cap: false,
        }
    }

    pub fn reset(&mut self, max: u32) {
        *self = Self::new(max);
    }

    pub fn is_limited(&self) -> bool {
        self.max > 0
    }

    /// Records `hit_cap` when the check fails.
    pub fn can_spend_traces(&mut self, count: u32) -> bool {
        if count == 0 || !self.is_limited() {
            return true;
        }
        let ok = self.used.saturating_add(count) <= self.max;
        if !ok {
            self.hit_cap = true;
        }
        ok
    }

    pub fn spend_trace(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn hit_cap(&self) -> bool {
        self.hit_cap
    }
}

/// First target index of this update's round-robin window.
pub fn next_target_start_index(round_robin_index: usize, target_count: usize) -> usize {
    if target_count == 0 {
        0
    } else {
        round_robin_index % target_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_budget_refuses_past_max() {
        let mut budget = TraceBudget::new(2);
        assert!(budget.can_spend_traces(1));
        budget.spend_trace();
        budget.spend_trace();
        assert!(budget.can_spend_traces(0));
        assert!(!budget.hit_cap());
        assert!(!budget.can_spend_traces(1));
        assert!(budget.hit_cap());

        budget.reset(2);
        assert_eq!(budget.used(), 0);
        assert!(!budget.hit_cap());
    }

    #[test]
    fn zero_means_unlimited() {
        let mut budget = TraceBudget::new(0);
        for _ in 0..100 {
            assert!(budget.can_spend_traces(1));
            budget.spend_trace();
        }
        assert_eq!(budget.used(), 100);
    }

    #[test]
    fn start_index_wraps() {
        assert_eq!(next_target_start_index(7, 0), 0);
        assert_eq!(next_target_start_index(7, 3), 1);
    }
}
