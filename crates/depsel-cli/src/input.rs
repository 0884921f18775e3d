//! Loading graphs, configuration and deployed versions from disk.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::Path;

use depsel::{DependencyGraph, SolverConfig, Version};

/// Read a flat JSON graph description
pub fn load_graph(path: &Path) -> Result<DependencyGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let graph = DependencyGraph::from_json_str(&content)
        .with_context(|| format!("Failed to load dependency graph from {}", path.display()))?;
    log::info!("Loaded {} packages from {}", graph.len(), path.display());
    Ok(graph)
}

/// Read a TOML solver configuration, or the defaults without a path
pub fn load_config(path: Option<&Path>) -> Result<SolverConfig> {
    let Some(path) = path else {
        return Ok(SolverConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Read currently deployed versions from a JSON object `{name: version}`
pub fn load_current(path: &Path) -> Result<Vec<(String, Version)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let raw: IndexMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("Expected a JSON object of package versions in {}", path.display()))?;

    raw.into_iter()
        .map(|(name, version)| {
            let version = Version::parse(&version)
                .with_context(|| format!("Invalid current version for {}", name))?;
            Ok((name, version))
        })
        .collect()
}
