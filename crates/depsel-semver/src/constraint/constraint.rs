//! Single version constraint implementation

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::Operator;
use crate::Version;

lazy_static! {
    static ref CONSTRAINT_RE: Regex = Regex::new(r"^\s*([<>=~!^]+)?\s*(.*?)\s*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("Invalid operator \"{operator}\", expected one of: {expected}")]
    InvalidOperator { operator: String, expected: String },

    #[error("Invalid version \"{version}\"")]
    InvalidVersion { version: String },
}

/// A predicate over versions (e.g., ">= 1.0.0").
///
/// Every constraint describes a single interval of the version order, so the
/// versions of a package that satisfy it always form a contiguous run once
/// the versions are sorted. Two constraints are equal when they admit the
/// same interval, so `~> 1.2` and `~> 1.2.0` differ.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    operator: Operator,
    version: Option<Version>,
}

impl VersionConstraint {
    /// The unconstrained constraint
    pub fn any() -> Self {
        VersionConstraint {
            operator: Operator::Any,
            version: None,
        }
    }

    /// Create a constraint from an operator and a version
    pub fn new(operator: Operator, version: Version) -> Self {
        if operator == Operator::Any {
            return Self::any();
        }
        VersionConstraint {
            operator,
            version: Some(version),
        }
    }

    /// Shorthand for `= version`
    pub fn exactly(version: Version) -> Self {
        Self::new(Operator::Equal, version)
    }

    /// Parse a constraint string such as `"= 1.0.0"`, `">=2"` or `""`
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let invalid_version = || ConstraintError::InvalidVersion {
            version: input.trim().to_string(),
        };

        let caps = CONSTRAINT_RE.captures(input).ok_or_else(invalid_version)?;
        let version_str = caps.get(2).map_or("", |m| m.as_str());

        let Some(op) = caps.get(1) else {
            if version_str.is_empty() || version_str == "*" {
                return Ok(Self::any());
            }
            // A bare version pins that version
            return Ok(Self::exactly(Version::parse(version_str)?));
        };

        let operator = Operator::from_str(op.as_str()).map_err(|_| ConstraintError::InvalidOperator {
            operator: op.as_str().to_string(),
            expected: Operator::supported_operators().join(", "),
        })?;

        if version_str.is_empty() {
            return Err(invalid_version());
        }

        Ok(Self::new(operator, Version::parse(version_str)?))
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version the operator applies to; `None` when unconstrained
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn is_any(&self) -> bool {
        self.operator == Operator::Any
    }

    /// Lower and upper bound of the interval this constraint admits
    pub fn bounds(&self) -> (Bound<Version>, Bound<Version>) {
        let Some(v) = self.version else {
            return (Bound::Unbounded, Bound::Unbounded);
        };

        match self.operator {
            Operator::Any => (Bound::Unbounded, Bound::Unbounded),
            Operator::Equal => (Bound::Included(v), Bound::Included(v)),
            Operator::GreaterThan => (Bound::Excluded(v), Bound::Unbounded),
            Operator::GreaterThanOrEqual => (Bound::Included(v), Bound::Unbounded),
            Operator::LessThan => (Bound::Unbounded, Bound::Excluded(v)),
            Operator::LessThanOrEqual => (Bound::Unbounded, Bound::Included(v)),
            Operator::Pessimistic => (Bound::Included(v), Bound::Excluded(v.pessimistic_upper())),
        }
    }

    /// Check whether a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        let (lower, upper) = self.bounds();

        let above = match lower {
            Bound::Unbounded => true,
            Bound::Included(ref l) => version >= l,
            Bound::Excluded(ref l) => version > l,
        };
        let below = match upper {
            Bound::Unbounded => true,
            Bound::Included(ref u) => version <= u,
            Bound::Excluded(ref u) => version < u,
        };

        above && below
    }
}

impl PartialEq for VersionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.bounds() == other.bounds()
    }
}

impl Eq for VersionConstraint {}

impl Hash for VersionConstraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bounds().hash(state);
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for VersionConstraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionConstraint::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.operator, version),
            None => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn c(s: &str) -> VersionConstraint {
        VersionConstraint::parse(s).unwrap()
    }

    #[test]
    fn test_constraint_creation() {
        let constraint = VersionConstraint::new(Operator::Equal, v("1.0.0"));
        assert_eq!(constraint.version(), Some(&v("1.0.0")));
        assert_eq!(constraint.operator(), Operator::Equal);
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(c(">=1.0.0").to_string(), ">= 1.0.0");
        assert_eq!(c("~> 1.2").to_string(), "~> 1.2");
        assert_eq!(c("").to_string(), "*");
    }

    #[test]
    fn test_parse_unconstrained() {
        assert!(c("").is_any());
        assert!(c("   ").is_any());
        assert!(c("*").is_any());
        assert_eq!(c(""), VersionConstraint::any());
    }

    #[test]
    fn test_parse_bare_version_is_equal() {
        assert_eq!(c("1.0.0"), c("= 1.0.0"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            VersionConstraint::parse("!= 1.0.0"),
            Err(ConstraintError::InvalidOperator { .. })
        ));
        assert!(matches!(
            VersionConstraint::parse("^1.0"),
            Err(ConstraintError::InvalidOperator { .. })
        ));
        assert!(matches!(
            VersionConstraint::parse(">="),
            Err(ConstraintError::InvalidVersion { .. })
        ));
        assert!(matches!(
            VersionConstraint::parse("= one"),
            Err(ConstraintError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_matches_comparisons() {
        assert!(c("= 2.0.0").matches(&v("2.0")));
        assert!(!c("= 2.0.0").matches(&v("2.0.1")));
        assert!(c("> 1.0.0").matches(&v("1.0.1")));
        assert!(!c("> 1.0.0").matches(&v("1.0.0")));
        assert!(c(">= 1.0.0").matches(&v("1.0.0")));
        assert!(c("< 2.0.0").matches(&v("1.99.0")));
        assert!(!c("< 2.0.0").matches(&v("2.0.0")));
        assert!(c("<= 2.0.0").matches(&v("2.0.0")));
        assert!(c("").matches(&v("0.0.1")));
    }

    #[test]
    fn test_matches_pessimistic() {
        let patch_level = c("~> 1.2.3");
        assert!(patch_level.matches(&v("1.2.3")));
        assert!(patch_level.matches(&v("1.2.99")));
        assert!(!patch_level.matches(&v("1.3.0")));
        assert!(!patch_level.matches(&v("1.2.2")));

        let minor_level = c("~> 1.2");
        assert!(minor_level.matches(&v("1.2.0")));
        assert!(minor_level.matches(&v("1.9.9")));
        assert!(!minor_level.matches(&v("2.0.0")));
        assert!(!minor_level.matches(&v("1.1.9")));
    }

    #[test]
    fn test_pessimistic_equality_follows_interval() {
        use std::collections::HashSet;

        let minor_level = c("~> 1.2");
        let patch_level = c("~> 1.2.0");
        assert!(minor_level.matches(&v("1.5.0")));
        assert!(!patch_level.matches(&v("1.5.0")));
        assert_ne!(minor_level, patch_level);

        // Same interval, written differently
        assert_eq!(c("~> 1"), c("~> 1.0"));
        assert_eq!(c(">= 1.0"), c(">= 1.0.0"));

        let set: HashSet<_> = [minor_level, patch_level, c("~> 1.2")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_bounds() {
        let (lower, upper) = c(">= 1.0.0").bounds();
        assert_eq!(lower, Bound::Included(v("1.0.0")));
        assert_eq!(upper, Bound::Unbounded);

        let (lower, upper) = c("~> 1.2.3").bounds();
        assert_eq!(lower, Bound::Included(v("1.2.3")));
        assert_eq!(upper, Bound::Excluded(v("1.3.0")));
    }
}
