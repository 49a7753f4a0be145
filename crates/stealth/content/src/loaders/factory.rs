//! Content factory for assembling a simulation from data files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stealth_core::ScoringConfig;
use stealth_runtime::Scenario;

use crate::loaders::{ConfigLoader, GuardProfile, GuardProfileLoader, LoadResult, ScenarioLoader};

/// Content factory that loads all stealth content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── scoring.toml
/// ├── guards.ron
/// └── scenarios/
///     └── courtyard.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Data bundled with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load the base scoring config from `scoring.toml`. A missing file
    /// yields the defaults.
    pub fn load_scoring(&self) -> LoadResult<ScoringConfig> {
        let path = self.data_dir.join("scoring.toml");
        if !path.exists() {
            tracing::info!("No {} found; using default scoring", path.display());
            return Ok(ScoringConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load guard archetypes from `guards.ron`.
    pub fn load_guard_profiles(&self) -> LoadResult<BTreeMap<String, GuardProfile>> {
        GuardProfileLoader::load(&self.data_dir.join("guards.ron"))
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        ScenarioLoader::load(&self.scenarios_dir().join(format!("{name}.ron")))
    }

    pub fn list_scenarios(&self) -> LoadResult<Vec<String>> {
        ScenarioLoader::list(&self.scenarios_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn scenarios_dir(&self) -> PathBuf {
        self.data_dir.join("scenarios")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCENARIO: &str = r#"(
        name: "alley",
        subject: Some("player"),
        actors: [
            (name: "player", kind: "player", team: 1, location: (x: 0.0, y: 0.0, z: 0.0)),
            (name: "guard", kind: "guard", team: 2, location: (x: 600.0, y: 0.0, z: 0.0),
             archetype: Some("sentry")),
        ],
    )"#;

    fn setup() -> (TempDir, ContentFactory) {
        let temp_dir = TempDir::new().unwrap();
        let factory = ContentFactory::new(temp_dir.path());
        (temp_dir, factory)
    }

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn missing_scoring_file_uses_defaults() {
        let (_temp, factory) = setup();
        assert_eq!(factory.load_scoring().unwrap(), ScoringConfig::default());
        assert!(factory.load_guard_profiles().is_err());
    }

    #[test]
    fn loads_files_from_the_data_dir() {
        let (temp, factory) = setup();
        std::fs::write(temp.path().join("scoring.toml"), "[blend]\nai_suspicion = 0.8\n").unwrap();
        std::fs::write(
            temp.path().join("guards.ron"),
            r#"{ "sentry": (guard: Some((max_suspicion: 2.0))) }"#,
        )
        .unwrap();
        std::fs::create_dir(temp.path().join("scenarios")).unwrap();
        std::fs::write(temp.path().join("scenarios/alley.ron"), SCENARIO).unwrap();
        std::fs::write(temp.path().join("scenarios/notes.txt"), "ignored").unwrap();

        assert_eq!(factory.load_scoring().unwrap().blend.ai_suspicion, 0.8);
        let profiles = factory.load_guard_profiles().unwrap();
        assert_eq!(profiles["sentry"].guard.as_ref().unwrap().max_suspicion, 2.0);
        assert_eq!(factory.list_scenarios().unwrap(), vec!["alley".to_string()]);

        let scenario = factory.load_scenario("alley").unwrap();
        assert_eq!(scenario.name, "alley");
        assert_eq!(scenario.actors.len(), 2);
        assert!(factory.load_scenario("missing").is_err());
    }

    #[test]
    fn invalid_scenario_reports_the_path() {
        let (temp, factory) = setup();
        std::fs::create_dir(temp.path().join("scenarios")).unwrap();
        let broken = SCENARIO.replace("subject: Some(\"player\")", "subject: Some(\"nobody\")");
        std::fs::write(temp.path().join("scenarios/broken.ron"), broken).unwrap();

        let err = factory.load_scenario("broken").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn bundled_content_loads() {
        let factory = ContentFactory::bundled();
        factory.load_scoring().unwrap();
        let profiles = factory.load_guard_profiles().unwrap();
        for name in factory.list_scenarios().unwrap() {
            let scenario = factory.load_scenario(&name).unwrap();
            for actor in &scenario.actors {
                if let Some(archetype) = &actor.archetype {
                    assert!(profiles.contains_key(archetype), "{name}: unknown archetype {archetype}");
                }
            }
        }
    }
}
