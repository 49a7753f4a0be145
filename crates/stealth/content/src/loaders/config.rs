//! Scoring configuration loader.

use std::path::Path;

use stealth_core::ScoringConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for the aggregator's base [`ScoringConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a scoring config. Omitted tables and keys keep their defaults.
    ///
    /// An inconsistent config is logged and returned as written; the
    /// aggregator applies its sanitized copy.
    pub fn load(path: &Path) -> LoadResult<ScoringConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scoring TOML at {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<ScoringConfig> {
        let config: ScoringConfig = toml::from_str(content)?;
        if let Err(e) = config.validate() {
            tracing::warn!("Scoring config will be sanitized: {}", e);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_keep_defaults() {
        let config = ConfigLoader::parse(
            r#"
            [blend]
            local_visibility = 0.7
            ai_suspicion = 0.3

            [tiers]
            danger_min = 0.55
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.blend.local_visibility, 0.7);
        assert_eq!(config.tiers.danger_min, 0.55);
        assert_eq!(config.tiers.cautious_min, ScoringConfig::default().tiers.cautious_min);
        assert_eq!(config.evidence, ScoringConfig::default().evidence);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(ConfigLoader::parse("[blend]\nlocal_visibility = \"high\"").is_err());
    }
}
