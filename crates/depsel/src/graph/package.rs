use depsel_semver::{Version, VersionConstraint};

use crate::error::GraphError;
use crate::solver::DenselyPackedDomain;

/// "This version requires `target` at a version satisfying `constraint`."
///
/// The target is referenced by name and resolved against the owning
/// [`DependencyGraph`](super::DependencyGraph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    target: String,
    constraint: VersionConstraint,
}

impl Dependency {
    pub fn new(target: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            target: target.into(),
            constraint,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }
}

/// One version of a package together with its dependencies
#[derive(Debug, Clone)]
pub struct PackageVersion {
    version: Version,
    dependencies: Vec<Dependency>,
}

impl PackageVersion {
    fn new(version: Version) -> Self {
        Self {
            version,
            dependencies: Vec::new(),
        }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Add a dependency edge from this version
    pub fn add_dependency(&mut self, target: impl Into<String>, constraint: VersionConstraint) -> &mut Self {
        self.dependencies.push(Dependency::new(target, constraint));
        self
    }
}

/// A named package and all of its known versions.
///
/// Once frozen, the package owns a [`DenselyPackedDomain`] over its versions
/// and refuses further versions.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    versions: Vec<PackageVersion>,
    domain: Option<DenselyPackedDomain>,
}

impl Package {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            domain: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versions in the order they were added
    pub fn versions(&self) -> &[PackageVersion] {
        &self.versions
    }

    /// Add a version, or return the existing entry for an equal version.
    pub fn add_version(&mut self, version: Version) -> Result<&mut PackageVersion, GraphError> {
        if self.is_frozen() {
            return Err(GraphError::Frozen {
                package: self.name.clone(),
            });
        }

        let index = match self.versions.iter().position(|pv| pv.version == version) {
            Some(index) => index,
            None => {
                self.versions.push(PackageVersion::new(version));
                self.versions.len() - 1
            }
        };
        Ok(&mut self.versions[index])
    }

    /// Find a version entry by version
    pub fn version(&self, version: &Version) -> Option<&PackageVersion> {
        self.versions.iter().find(|pv| &pv.version == version)
    }

    pub fn is_frozen(&self) -> bool {
        self.domain.is_some()
    }

    /// The packed domain, available once the package is frozen
    pub fn domain(&self) -> Option<&DenselyPackedDomain> {
        self.domain.as_ref()
    }

    pub(crate) fn freeze(&mut self) -> &DenselyPackedDomain {
        let versions = &self.versions;
        self.domain
            .get_or_insert_with(|| DenselyPackedDomain::new(versions.iter().map(|pv| pv.version)))
    }
}
