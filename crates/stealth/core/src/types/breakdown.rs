//! Read-only snapshots produced by each recompute.

use bitflags::bitflags;

use super::tier::{StealthLevel, StealthTier};

bitflags! {
    /// Derived state tags of the tracked subject.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StealthFlags: u8 {
        const BRIGHT   = 1 << 0;
        const DARK     = 1 << 1;
        const IN_COVER = 1 << 2;
        const DETECTED = 1 << 3;
    }
}

impl StealthFlags {
    pub const BRIGHT_LIGHT_MIN: f32 = 0.6;
    pub const DARK_SHADOW_MIN: f32 = 0.6;
    pub const COVER_EXPOSURE_MAX: f32 = 0.35;

    pub fn derive(light01: f32, shadow01: f32, cover_exposure01: f32, detected: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::BRIGHT, light01 > Self::BRIGHT_LIGHT_MIN);
        flags.set(Self::DARK, shadow01 > Self::DARK_SHADOW_MIN);
        flags.set(Self::IN_COVER, cover_exposure01 <= Self::COVER_EXPOSURE_MAX);
        flags.set(Self::DETECTED, detected);
        flags
    }
}

/// Snapshot of one recompute. Superseded wholesale by the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StealthScoreBreakdown {
    /// Light after modifiers.
    pub light01: f32,
    pub shadow01: f32,
    /// Local visibility after visibility multipliers.
    pub visibility01: f32,
    pub ai_suspicion01: f32,
    /// Weighted blend before modifiers.
    pub combined_score01: f32,
    /// After modifiers, smoothing and detection pinning.
    pub effective_score01: f32,
    pub tier: StealthTier,
    pub level: StealthLevel,
    /// `effective / combined`, or 1 when combined is 0.
    pub modifier_multiplier: f32,
}

/// Channel values of the tracked subject as last ingested.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerStealthState {
    pub light_level01: f32,
    pub shadow_level01: f32,
    pub local_visibility01: f32,
    pub movement_noise01: f32,
    /// 0 fully covered, 1 fully exposed.
    pub cover_exposure01: f32,
    pub weather_level01: f32,
    pub ai_suspicion01: f32,
    pub stealth_score01: f32,
    pub tier: StealthTier,
    pub level: StealthLevel,
    pub flags: StealthFlags,
}

impl PlayerStealthState {
    pub fn refresh_flags(&mut self, detected: bool) {
        self.flags = StealthFlags::derive(
            self.light_level01,
            self.shadow_level01,
            self.cover_exposure01,
            detected,
        );
    }

    pub fn is_detected(&self) -> bool {
        self.flags.contains(StealthFlags::DETECTED)
    }
}

impl Default for PlayerStealthState {
    fn default() -> Self {
        Self {
            light_level01: 0.0,
            shadow_level01: 1.0,
            local_visibility01: 0.0,
            movement_noise01: 0.0,
            cover_exposure01: 1.0,
            weather_level01: 0.0,
            ai_suspicion01: 0.0,
            stealth_score01: 0.0,
            tier: StealthTier::Hidden,
            level: StealthLevel::Undetected,
            flags: StealthFlags::DARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_channel_thresholds() {
        let flags = StealthFlags::derive(0.8, 0.2, 1.0, false);
        assert_eq!(flags, StealthFlags::BRIGHT);

        let flags = StealthFlags::derive(0.1, 0.9, 0.0, true);
        assert!(flags.contains(StealthFlags::DARK | StealthFlags::IN_COVER | StealthFlags::DETECTED));
        assert!(!flags.contains(StealthFlags::BRIGHT));
    }
}
