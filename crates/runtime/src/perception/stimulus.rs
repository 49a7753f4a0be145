//! Pending noise/damage stimuli and their per-tag cooldowns.

use std::collections::BTreeMap;

use stealth_core::Vec3;

/// Key used for untagged stimuli.
const UNTAGGED: &str = "";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StimulusMemory {
    /// Consumed by the next update as a one-tick hearing stimulus.
    pending_hearing: f32,
    pending_damage: f32,
    noise_ready_at: BTreeMap<String, f64>,
    damage_ready_at: BTreeMap<String, f64>,
    last_location: Option<Vec3>,
    last_damage_at: Option<f64>,
}

impl StimulusMemory {
    /// Starts the cooldown and returns true unless one is still running.
    pub fn try_start_noise_cooldown(&mut self, tag: Option<&str>, now: f64, cooldown: f32) -> bool {
        Self::try_start(&mut self.noise_ready_at, tag, now, cooldown)
    }

    pub fn try_start_damage_cooldown(&mut self, tag: Option<&str>, now: f64, cooldown: f32) -> bool {
        Self::try_start(&mut self.damage_ready_at, tag, now, cooldown)
    }

    fn try_start(ready_at: &mut BTreeMap<String, f64>, tag: Option<&str>, now: f64, cooldown: f32) -> bool {
        let key = tag.unwrap_or(UNTAGGED);
        if ready_at.get(key).is_some_and(|ready| now < *ready) {
            return false;
        }
        if cooldown > 0.0 {
            ready_at.insert(key.to_owned(), now + f64::from(cooldown));
        }
        true
    }

    pub fn push_hearing(&mut self, strength01: f32, location: Vec3) {
        self.pending_hearing = self.pending_hearing.max(strength01);
        self.last_location = Some(location);
    }

    pub fn push_damage(&mut self, strength01: f32, location: Option<Vec3>, now: f64) {
        self.pending_damage = self.pending_damage.max(strength01);
        if location.is_some() {
            self.last_location = location;
        }
        self.last_damage_at = Some(now);
    }

    /// Pending `(hearing, damage)` strengths, cleared by this call.
    pub fn take_pending(&mut self) -> (f32, f32) {
        let pending = (self.pending_hearing, self.pending_damage);
        self.pending_hearing = 0.0;
        self.pending_damage = 0.0;
        pending
    }

    pub fn last_location(&self) -> Option<Vec3> {
        self.last_location
    }

    pub fn last_damage_at(&self) -> Option<f64> {
        self.last_damage_at
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_is_per_tag() {
        let mut memory = StimulusMemory::default();
        assert!(memory.try_start_noise_cooldown(Some("footstep"), 0.0, 1.0));
        assert!(!memory.try_start_noise_cooldown(Some("footstep"), 0.5, 1.0));
        assert!(memory.try_start_noise_cooldown(Some("gunshot"), 0.5, 1.0));
        assert!(memory.try_start_noise_cooldown(Some("footstep"), 1.0, 1.0));
        assert!(memory.try_start_noise_cooldown(None, 1.0, 0.0));
        assert!(memory.try_start_noise_cooldown(None, 1.0, 0.0));
    }

    #[test]
    fn pending_is_consumed_once() {
        let mut memory = StimulusMemory::default();
        memory.push_hearing(0.4, Vec3::ZERO);
        memory.push_hearing(0.2, Vec3::ZERO);
        memory.push_damage(1.0, None, 2.0);
        assert_eq!(memory.take_pending(), (0.4, 1.0));
        assert_eq!(memory.take_pending(), (0.0, 0.0));
        assert_eq!(memory.last_damage_at(), Some(2.0));
    }
}
