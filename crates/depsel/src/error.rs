//! Error types for graph construction and solving

use std::fmt;

use depsel_semver::ConstraintError;
use thiserror::Error;

use crate::selector::SolutionConstraint;
use crate::solver::SearchError;

/// Errors raised while building or freezing a [`DependencyGraph`](crate::DependencyGraph)
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Package {package} is frozen; versions cannot be added once solving has started")]
    Frozen { package: String },

    #[error("Package {package} has not been frozen")]
    NotFrozen { package: String },

    #[error("{package} {version} depends on unknown package {target}")]
    UnknownDependency {
        package: String,
        version: String,
        target: String,
    },

    #[error("Invalid entry for {package}: {source}")]
    InvalidEntry {
        package: String,
        #[source]
        source: ConstraintError,
    },

    #[error("Failed to parse dependency graph: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a solution constraint was blamed for the lack of a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The constraint names a package the graph does not contain
    UnknownPackage,
    /// No version of the package satisfies the constraint
    NoMatchingVersion,
    /// Adding the constraint to the ones before it made the problem infeasible
    Conflict,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConflictReason::UnknownPackage => "names a package that is not in the dependency graph",
            ConflictReason::NoMatchingVersion => "matches no available version",
            ConflictReason::Conflict => {
                "conflicts with the dependency graph and the constraints listed before it"
            }
        };
        f.write_str(text)
    }
}

/// Errors raised while parsing a `"NAME[ CONSTRAINT]"` solution constraint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolutionConstraintError {
    #[error("Solution constraint \"{input}\" does not name a package")]
    MissingName { input: String },

    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

/// Errors returned by [`Selector`](crate::Selector) solve operations
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("No solution exists: {constraint} {reason}")]
    NoSolution {
        constraint: SolutionConstraint,
        reason: ConflictReason,
    },

    #[error("The dependency graph has no solution even without solution constraints")]
    InconsistentGraph,

    #[error("No solution scores better than the given floor")]
    BelowFloor,

    #[error("Search budget exceeded after {nodes} nodes; satisfiability is unknown")]
    BudgetExceeded { nodes: u64 },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SolveError {
    /// The solution constraint blamed for infeasibility, if any
    pub fn unsatisfiable_constraint(&self) -> Option<&SolutionConstraint> {
        match self {
            SolveError::NoSolution { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

impl From<SearchError> for SolveError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::BudgetExceeded { nodes } => SolveError::BudgetExceeded { nodes },
        }
    }
}
