//! Content loaders for reading stealth data from files.

pub mod config;
pub mod factory;
pub mod guards;
pub mod scenario;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use guards::{GuardProfile, GuardProfileLoader};
pub use scenario::ScenarioLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
