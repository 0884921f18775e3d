use log::{debug, info};

use super::policy::Policy;
use super::problem::VersionProblem;
use super::solver::{SearchError, SearchLimits, Solver};

/// Outcome of diagnosing an infeasible problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// Infeasible even before any solution constraint applies
    InconsistentGraph,
    /// Index of the first solution constraint that makes the problem infeasible
    Culprit(usize),
}

/// Locates the solution constraint responsible for infeasibility.
///
/// Solution constraints are re-applied in order; the first prefix that no
/// longer has a solution names the culprit. Constraints are never reordered,
/// so the reported culprit depends on the order they were given in.
pub struct ConflictDiagnoser<'a> {
    problem: &'a VersionProblem,
    policy: &'a Policy,
    limits: SearchLimits,
}

impl<'a> ConflictDiagnoser<'a> {
    pub fn new(problem: &'a VersionProblem, policy: &'a Policy) -> Self {
        Self {
            problem,
            policy,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns `None` if the full problem turns out to be feasible.
    pub fn diagnose(&self) -> Result<Option<Diagnosis>, SearchError> {
        let count = self.problem.root_rule_count();

        for keep in 0..=count {
            let prefix = self.problem.with_root_prefix(keep);
            let feasible = Solver::new(&prefix, self.policy)
                .with_limits(self.limits)
                .solve()?
                .is_some();
            debug!("Constraint prefix of length {}: feasible={}", keep, feasible);

            if !feasible {
                let diagnosis = match keep {
                    0 => Diagnosis::InconsistentGraph,
                    keep => Diagnosis::Culprit(keep - 1),
                };
                info!("Diagnosed infeasibility: {:?}", diagnosis);
                return Ok(Some(diagnosis));
            }
        }

        Ok(None)
    }
}
