//! Guard archetype loader.
//!
//! Loads perception and suspicion tuning per archetype from a RON map.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stealth_core::{GuardConfig, PerceptionConfig};

use crate::loaders::{LoadResult, read_file};

/// Tuning of one guard archetype.
///
/// A profile without `guard` perceives but never accumulates suspicion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardProfile {
    pub perception: PerceptionConfig,
    pub guard: Option<GuardConfig>,
}

impl GuardProfile {
    /// Shared configs for every agent of this archetype.
    pub fn shared(&self) -> (Arc<PerceptionConfig>, Option<Arc<GuardConfig>>) {
        (
            Arc::new(self.perception.clone()),
            self.guard.clone().map(Arc::new),
        )
    }
}

/// Loader for guard archetypes from RON files.
pub struct GuardProfileLoader;

impl GuardProfileLoader {
    /// RON format: `{ "archetype": GuardProfile, ... }`
    ///
    /// ```ron
    /// {
    ///     "sentry": (perception: (max_sight_distance: 2000.0), guard: Some((sight_suspicion_per_second: 0.3))),
    /// }
    /// ```
    pub fn load(path: &Path) -> LoadResult<BTreeMap<String, GuardProfile>> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse guard profiles RON at {}: {}", path.display(), e)
        })
    }

    pub fn parse(content: &str) -> LoadResult<BTreeMap<String, GuardProfile>> {
        let profiles: BTreeMap<String, GuardProfile> = ron::from_str(content)?;
        for (name, profile) in &profiles {
            let thresholds = &profile.perception.thresholds;
            if !(thresholds.soft_suspicious <= thresholds.hard_suspicious
                && thresholds.hard_suspicious <= thresholds.alerted)
            {
                tracing::warn!("Guard archetype '{}' has unordered perception thresholds", name);
            }
        }
        tracing::debug!("Loaded {} guard archetypes", profiles.len());
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_core::PerceptionState;

    #[test]
    fn profiles_fill_defaults_and_tagged_policies() {
        let profiles = GuardProfileLoader::parse(
            r#"{
                "sentry": (
                    perception: (max_sight_distance: 1800.0, max_targets_per_update: 1),
                    guard: Some((
                        sight_suspicion_per_second: 0.4,
                        damage_by_tag: {
                            "arrow": (force_minimum_state: Some(HardSuspicious)),
                        },
                    )),
                ),
                "camera": (perception: (core_fov_degrees: 40.0)),
            }"#,
        )
        .expect("valid ron");

        let sentry = &profiles["sentry"];
        assert_eq!(sentry.perception.max_sight_distance, 1800.0);
        assert_eq!(sentry.perception.eye_height, PerceptionConfig::default().eye_height);
        let guard = sentry.guard.as_ref().expect("guard tuning");
        assert_eq!(guard.sight_suspicion_per_second, 0.4);
        assert_eq!(
            guard.damage_policy(Some("arrow")).force_minimum_state,
            Some(PerceptionState::HardSuspicious)
        );
        assert_eq!(guard.damage_policy(Some("arrow")).suspicion_impulse01, 0.35);

        let camera = &profiles["camera"];
        assert!(camera.guard.is_none());
        assert_eq!(camera.shared().0.core_fov_degrees, 40.0);
    }
}
