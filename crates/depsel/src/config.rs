//! Solver configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::solver::{Policy, SearchLimits};

/// Settings shared by every solve of a [`Selector`](crate::Selector).
///
/// Deserializes from a table such as
///
/// ```toml
/// prefer-lowest = false
/// max-nodes = 100000
/// timeout-ms = 5000
/// prune-unreachable = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SolverConfig {
    /// Try the lowest version of each package first
    pub prefer_lowest: bool,
    /// Maximum number of search nodes per search
    pub max_nodes: Option<u64>,
    /// Wall-clock limit per search, in milliseconds
    pub timeout_ms: Option<u64>,
    /// Omit packages no solution constraint reaches
    pub prune_unreachable: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            prefer_lowest: false,
            max_nodes: None,
            timeout_ms: None,
            prune_unreachable: true,
        }
    }
}

impl SolverConfig {
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_nodes: self.max_nodes,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn policy(&self) -> Policy {
        Policy::new().prefer_lowest(self.prefer_lowest)
    }
}
