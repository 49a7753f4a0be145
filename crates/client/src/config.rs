//! Simulation configuration loaded from the process environment.
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use stealth_content::ContentFactory;
use stealth_runtime::SimulationConfig;

/// Everything the binary needs to assemble and run one simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Content directory; the bundled data when unset.
    pub data_dir: Option<PathBuf>,
    pub scenario: String,
    pub ticks: u64,
    pub tick_seconds: f64,
    pub seed: u64,
    pub session_id: Option<String>,
}

impl SimConfig {
    pub const DEFAULT_SCENARIO: &'static str = "courtyard";
    pub const DEFAULT_TICKS: u64 = 400;
    pub const EVENT_BUFFER_SIZE: usize = 1024;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STEALTH_DATA_DIR` - Content directory (default: bundled data)
    /// - `STEALTH_SCENARIO` - Scenario name under `scenarios/` (default: courtyard)
    /// - `STEALTH_TICKS` - Number of ticks to run (default: 400)
    /// - `STEALTH_TICK_SECONDS` - Fixed timestep, must be positive (default: 0.05)
    /// - `STEALTH_SEED` - Session seed for schedule jitter (default: 0)
    /// - `STEALTH_SESSION_ID` - Log directory name (default: timestamp)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
            value?.trim().parse().ok()
        }

        let mut config = Self::default();
        config.data_dir = lookup("STEALTH_DATA_DIR").map(PathBuf::from);
        if let Some(scenario) = lookup("STEALTH_SCENARIO").filter(|s| !s.trim().is_empty()) {
            config.scenario = scenario;
        }
        if let Some(ticks) = parse(lookup("STEALTH_TICKS")) {
            config.ticks = ticks;
        }
        if let Some(seconds) = parse::<f64>(lookup("STEALTH_TICK_SECONDS")).filter(|s| *s > 0.0) {
            config.tick_seconds = seconds;
        }
        if let Some(seed) = parse(lookup("STEALTH_SEED")) {
            config.seed = seed;
        }
        config.session_id = lookup("STEALTH_SESSION_ID").filter(|s| !s.trim().is_empty());
        config
    }

    /// Session id, generated from the current time when not configured.
    pub fn session_id(&self) -> String {
        self.session_id.clone().unwrap_or_else(|| {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            format!("session_{timestamp}")
        })
    }

    pub fn content_factory(&self) -> ContentFactory {
        match &self.data_dir {
            Some(dir) => ContentFactory::new(dir.clone()),
            None => ContentFactory::bundled(),
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            tick_seconds: self.tick_seconds,
            event_buffer_size: Self::EVENT_BUFFER_SIZE,
            session_seed: self.seed,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            scenario: Self::DEFAULT_SCENARIO.to_owned(),
            ticks: Self::DEFAULT_TICKS,
            tick_seconds: SimulationConfig::DEFAULT_TICK_SECONDS,
            seed: 0,
            session_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(SimConfig::from_lookup(|_| None), SimConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = SimConfig::from_lookup(lookup(&[
            ("STEALTH_DATA_DIR", "/srv/stealth"),
            ("STEALTH_SCENARIO", "rooftops"),
            ("STEALTH_TICKS", "120"),
            ("STEALTH_TICK_SECONDS", "0.1"),
            ("STEALTH_SEED", "42"),
            ("STEALTH_SESSION_ID", "replay"),
        ]));
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/stealth")));
        assert_eq!(config.scenario, "rooftops");
        assert_eq!(config.ticks, 120);
        assert_eq!(config.tick_seconds, 0.1);
        assert_eq!(config.seed, 42);
        assert_eq!(config.session_id(), "replay");
    }

    #[test]
    fn malformed_values_are_ignored() {
        let config = SimConfig::from_lookup(lookup(&[
            ("STEALTH_TICKS", "many"),
            ("STEALTH_TICK_SECONDS", "-1"),
            ("STEALTH_SCENARIO", "  "),
        ]));
        assert_eq!(config.ticks, SimConfig::DEFAULT_TICKS);
        assert_eq!(config.tick_seconds, SimulationConfig::DEFAULT_TICK_SECONDS);
        assert_eq!(config.scenario, SimConfig::DEFAULT_SCENARIO);
    }
}
