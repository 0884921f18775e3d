//! Version identifiers and version constraints for depsel.
//!
//! This crate defines the total order used to pack a package's versions into
//! a dense integer range, and the small constraint language used by
//! dependency edges and solution constraints:
//!
//! ```text
//! ""  |  "*"  |  "V"  |  "= V"  |  ">= V"  |  "<= V"  |  "> V"  |  "< V"  |  "~> V"
//! ```
//!
//! # Example
//!
//! ```
//! use depsel_semver::{Version, VersionConstraint};
//!
//! let constraint: VersionConstraint = "~> 1.2".parse().unwrap();
//! assert!(constraint.matches(&Version::parse("1.9.0").unwrap()));
//! assert!(!constraint.matches(&Version::parse("2.0.0").unwrap()));
//! ```

mod constraint;
mod version;

pub use constraint::{ConstraintError, Operator, VersionConstraint};
pub use version::Version;
