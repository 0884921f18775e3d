//! depsel: select one consistent version per package.
//!
//! A [`DependencyGraph`] lists every package, its versions and the version
//! constraints each version places on other packages. The [`Selector`]
//! packs each package's versions into a dense integer range, encodes the
//! graph plus the caller's [`SolutionConstraint`]s as a constraint
//! satisfaction problem, searches it (optionally optimizing an
//! [`Objective`]) and decodes the result back into package versions.
//!
//! When no assignment exists, the selector reports the first solution
//! constraint whose addition made the problem infeasible.
//!
//! ```
//! use depsel::{DependencyGraph, Selector, SolutionConstraint};
//!
//! let graph = DependencyGraph::from_json_str(r#"[
//!     {"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}},
//!     {"key": ["A", "2.0.0"], "value": {"B": "= 1.0.0"}},
//!     {"key": ["B", "1.0.0"], "value": {}},
//!     {"key": ["B", "2.0.0"], "value": {}}
//! ]"#).unwrap();
//!
//! let selector = Selector::new(graph).unwrap();
//! let solution = selector
//!     .find_solution(&[SolutionConstraint::parse("B = 1.0.0").unwrap()])
//!     .unwrap();
//! assert_eq!(solution.get("B").unwrap().to_string(), "1.0.0");
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod objective;
pub mod selector;
pub mod solver;

pub use config::SolverConfig;
pub use error::{ConflictReason, GraphError, SolutionConstraintError, SolveError};
pub use graph::{Dependency, DependencyEntry, DependencyGraph, Package, PackageVersion};
pub use objective::{Lexicographic, MinimizeChurn, Objective, PreferLatest, Score};
pub use selector::{Selector, Solution, SolutionConstraint, SolvedPackage};

pub use depsel_semver::{ConstraintError, Operator, Version, VersionConstraint};
