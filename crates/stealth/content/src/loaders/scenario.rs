//! Scenario loader.

use std::path::{Path, PathBuf};

use stealth_runtime::Scenario;

use crate::loaders::{LoadResult, read_file};

pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load and validate one scenario file.
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        Scenario::from_ron_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid scenario {}: {}", path.display(), e))
    }

    /// Scenario names (file stems) in `dir`, sorted.
    pub fn list(dir: &Path) -> LoadResult<Vec<String>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to list scenarios in {}: {}", dir.display(), e))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .filter_map(|path: PathBuf| path.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .collect();
        names.sort();
        Ok(names)
    }
}
