//! Constraint satisfaction core of the version selector.
//!
//! Package versions are packed into dense integer domains and dependency
//! edges become implication rules over them. A depth-first search with
//! propagation then looks for an assignment satisfying every rule.
//!
//! # Architecture
//!
//! - [`DenselyPackedDomain`]: maps a package's versions to `0..len` in order
//! - [`RuleGenerator`]: encodes a frozen graph plus solution constraints
//! - [`VersionProblem`]: variables and implication [`Rule`]s
//! - [`Solver`]: feasibility search and branch-and-bound optimization
//! - [`ConflictDiagnoser`]: blames the first solution constraint that breaks feasibility
//!
//! # Example
//!
//! ```
//! use depsel::solver::{IndexRange, Policy, Rule, Solver, VersionProblem};
//!
//! let mut problem = VersionProblem::new();
//! let a = problem.add_variable("A", IndexRange::new(0, 1));
//! let b = problem.add_variable("B", IndexRange::new(0, 1));
//! problem.add_rule(Rule::requires(a, 1, b, IndexRange::singleton(0)));
//!
//! let policy = Policy::default();
//! let assignment = Solver::new(&problem, &policy).solve().unwrap();
//! assert_eq!(assignment, Some(vec![1, 0]));
//! ```

mod decisions;
mod diagnose;
mod domain;
mod policy;
mod problem;
mod rule;
mod rule_generator;
mod solver;


pub use decisions::{Decisions, VarDomain};
pub use diagnose::{ConflictDiagnoser, Diagnosis};
pub use domain::{DenselyPackedDomain, DomainError, IndexRange};
pub use policy::Policy;
pub use problem::{Variable, VersionProblem};
pub use rule::{Consequence, Rule, RuleType, VarId};
pub use rule_generator::{Encoding, RuleGenerator, ROOT_VARIABLE};
pub use solver::{SearchError, SearchLimits, SearchStats, Solver};
