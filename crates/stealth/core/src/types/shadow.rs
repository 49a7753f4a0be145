use crate::math::Vec3;

/// Best-effort "nearest usable shadow" near the tracked subject.
///
/// `valid == false` means no shadow information is available, not that no
/// shadow exists.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadowCandidate {
    pub valid: bool,
    pub shadow_point: Vec3,
    pub dominant_light_dir: Vec3,
    pub illumination01: f32,
    pub strength01: f32,
    pub last_update_seconds: f64,
}

impl ShadowCandidate {
    pub fn invalid(illumination01: f32, now: f64) -> Self {
        Self {
            valid: false,
            illumination01,
            strength01: illumination01,
            last_update_seconds: now,
            ..Self::default()
        }
    }
}
