//! Dependency graph model
//!
//! The graph owns every [`Package`] by name. Dependency edges refer to their
//! target by name only, so packages may depend on each other cyclically
//! without shared ownership.

mod package;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use depsel_semver::{Version, VersionConstraint};

use crate::error::GraphError;

pub use package::{Dependency, Package, PackageVersion};

/// One row of the flat graph description:
/// `{"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// Package name and version
    pub key: (String, String),
    /// Dependency package name to constraint string
    #[serde(default)]
    pub value: IndexMap<String, String>,
}

/// All packages taking part in a selection, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    packages: IndexMap<String, Package>,
    frozen: bool,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from flat description entries.
    ///
    /// Packages are declared in order of first appearance, whether as an
    /// entry key or as a dependency target.
    pub fn from_description(entries: &[DependencyEntry]) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        for entry in entries {
            let (name, version_str) = &entry.key;
            let version = Version::parse(version_str).map_err(|source| GraphError::InvalidEntry {
                package: name.clone(),
                source,
            })?;

            let mut dependencies = Vec::with_capacity(entry.value.len());
            for (target, constraint_str) in &entry.value {
                let constraint =
                    VersionConstraint::parse(constraint_str).map_err(|source| GraphError::InvalidEntry {
                        package: format!("{} {} -> {}", name, version_str, target),
                        source,
                    })?;
                dependencies.push((target.as_str(), constraint));
            }

            let package_version = graph.package(name).add_version(version)?;
            for (target, constraint) in &dependencies {
                package_version.add_dependency(*target, constraint.clone());
            }
            for (target, _) in dependencies {
                graph.package(target);
            }
        }

        debug!("Loaded dependency graph with {} packages", graph.len());
        Ok(graph)
    }

    /// Build a graph from the JSON form of the flat description
    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let entries: Vec<DependencyEntry> = serde_json::from_str(json)?;
        Self::from_description(&entries)
    }

    /// Look up a package by name, creating it if it does not exist yet.
    ///
    /// A package created after [`freeze`](Self::freeze) is frozen immediately
    /// with no versions.
    pub fn package(&mut self, name: &str) -> &mut Package {
        let frozen = self.frozen;
        self.packages.entry(name.to_string()).or_insert_with(|| {
            let mut package = Package::new(name);
            if frozen {
                package.freeze();
            }
            package
        })
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Declaration index of a package
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.packages.get_index_of(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Package> {
        self.packages.get_index(index).map(|(_, package)| package)
    }

    /// Packages in declaration order
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Validate every dependency target and build each package's domain.
    ///
    /// Freezing twice is a no-op.
    pub fn freeze(&mut self) -> Result<(), GraphError> {
        if self.frozen {
            return Ok(());
        }

        for package in self.packages.values() {
            for package_version in package.versions() {
                for dependency in package_version.dependencies() {
                    if !self.packages.contains_key(dependency.target()) {
                        return Err(GraphError::UnknownDependency {
                            package: package.name().to_string(),
                            version: package_version.version().to_string(),
                            target: dependency.target().to_string(),
                        });
                    }
                }
            }
        }

        for package in self.packages.values_mut() {
            let packed = package.freeze().len();
            debug!("Packed {} versions of {}", packed, package.name());
        }
        self.frozen = true;
        Ok(())
    }
}
