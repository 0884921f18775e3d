use thiserror::Error;

use depsel_semver::{Version, VersionConstraint};

/// Raised when a constraint admits none of a package's versions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no version matches {constraint}")]
    Empty { constraint: VersionConstraint },
}

/// An inclusive range of dense version indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub lo: usize,
    pub hi: usize,
}

impl IndexRange {
    pub fn new(lo: usize, hi: usize) -> Self {
        debug_assert!(lo <= hi, "empty index range {lo}..={hi}");
        Self { lo, hi }
    }

    pub fn singleton(index: usize) -> Self {
        Self { lo: index, hi: index }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lo <= index && index <= self.hi
    }

    pub fn len(&self) -> usize {
        self.hi - self.lo + 1
    }

    pub fn is_singleton(&self) -> bool {
        self.lo == self.hi
    }
}

/// A package's versions packed into the contiguous range `0..len`.
///
/// Indices follow version order, so index `i < j` exactly when the version
/// at `i` is lower than the version at `j`. Equal versions share one index.
/// The mapping never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenselyPackedDomain {
    versions: Vec<Version>,
}

impl DenselyPackedDomain {
    pub fn new<I>(versions: I) -> Self
    where
        I: IntoIterator<Item = Version>,
    {
        let mut versions: Vec<Version> = versions.into_iter().collect();
        versions.sort();
        versions.dedup();
        Self { versions }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The full index range, or `None` for a package without versions
    pub fn range(&self) -> Option<IndexRange> {
        if self.versions.is_empty() {
            None
        } else {
            Some(IndexRange::new(0, self.versions.len() - 1))
        }
    }

    pub fn index_of(&self, version: &Version) -> Option<usize> {
        self.versions.binary_search(version).ok()
    }

    pub fn version_at(&self, index: usize) -> Option<&Version> {
        self.versions.get(index)
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Sorted, deduplicated versions
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// The maximal index range whose versions satisfy `constraint`.
    pub fn subrange_for(&self, constraint: &VersionConstraint) -> Result<IndexRange, DomainError> {
        let empty = || DomainError::Empty {
            constraint: constraint.clone(),
        };

        let lo = self.versions.iter().position(|v| constraint.matches(v)).ok_or_else(empty)?;
        let hi = self.versions.iter().rposition(|v| constraint.matches(v)).ok_or_else(empty)?;

        // Constraints are intervals over the version order
        debug_assert!(self.versions[lo..=hi].iter().all(|v| constraint.matches(v)));

        Ok(IndexRange::new(lo, hi))
    }
}
