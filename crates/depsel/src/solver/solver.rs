use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use thiserror::Error;

use super::decisions::Decisions;
use super::policy::Policy;
use super::problem::VersionProblem;
use super::rule::{Consequence, VarId};
use crate::objective::Score;

/// Budget for a single search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of tentative assignments
    pub max_nodes: Option<u64>,
    /// Wall-clock limit measured from the start of the search
    pub timeout: Option<Duration>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Counters collected during a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub failures: u64,
    pub solutions: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search budget exceeded after {nodes} nodes")]
    BudgetExceeded { nodes: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Depth-first search with propagation over a [`VersionProblem`].
///
/// Variables are branched smallest-domain-first (ties by variable order),
/// values in the order given by the [`Policy`]. Both orders are fixed, so
/// repeated searches over the same problem visit solutions in the same
/// order.
pub struct Solver<'a> {
    problem: &'a VersionProblem,
    policy: &'a Policy,
    limits: SearchLimits,
    stats: SearchStats,
    deadline: Option<Instant>,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a VersionProblem, policy: &'a Policy) -> Self {
        Self {
            problem,
            policy,
            limits: SearchLimits::default(),
            stats: SearchStats::default(),
            deadline: None,
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Find any assignment satisfying every rule.
    ///
    /// Returns `Ok(None)` when the problem is infeasible. Running out of
    /// budget is an error, never a claim of infeasibility.
    pub fn solve(&mut self) -> Result<Option<Vec<usize>>, SearchError> {
        self.start();
        let Some(mut decisions) = self.initial_decisions() else {
            return Ok(None);
        };

        let mut found = None;
        self.search(&mut decisions, &mut |assignment| {
            found = Some(assignment.to_vec());
            Flow::Stop
        })?;

        debug!(
            "Feasibility search: {} nodes, {} failures, solved={}",
            self.stats.nodes,
            self.stats.failures,
            found.is_some()
        );
        Ok(found)
    }

    /// Branch and bound: visit every feasible assignment and keep the one
    /// with the best score.
    ///
    /// A candidate replaces the incumbent only when strictly better, so
    /// among equal scores the first one found wins. With a `floor`, the
    /// first candidate must also beat it. If the budget runs out after at
    /// least one candidate was kept, that candidate is returned.
    pub fn optimize<F>(
        &mut self,
        mut objective: F,
        floor: Option<&Score>,
    ) -> Result<Option<(Vec<usize>, Score)>, SearchError>
    where
        F: FnMut(&[usize]) -> Score,
    {
        self.start();
        let Some(mut decisions) = self.initial_decisions() else {
            return Ok(None);
        };

        let mut best: Option<(Vec<usize>, Score)> = None;
        let result = self.search(&mut decisions, &mut |assignment| {
            let score = objective(assignment);
            let improves = match (&best, floor) {
                (Some((_, incumbent)), _) => score.is_better_than(incumbent),
                (None, Some(floor)) => score.is_better_than(floor),
                (None, None) => true,
            };
            if improves {
                debug!("New best candidate with score {:?}", score.values());
                best = Some((assignment.to_vec(), score));
            }
            Flow::Continue
        });

        debug!(
            "Optimizing search: {} nodes, {} failures, {} solutions",
            self.stats.nodes, self.stats.failures, self.stats.solutions
        );

        match result {
            Ok(_) => Ok(best),
            Err(err) => match best {
                Some(best) => {
                    warn!("{}; returning the best solution found so far", err);
                    Ok(Some(best))
                }
                None => Err(err),
            },
        }
    }

    fn start(&mut self) {
        self.stats = SearchStats::default();
        self.deadline = self.limits.timeout.map(|timeout| Instant::now() + timeout);
    }

    /// Apply forbidden values and propagate everything once before branching
    fn initial_decisions(&mut self) -> Option<Decisions> {
        let mut decisions = Decisions::new(self.problem);

        for rule in self.problem.rules() {
            if rule.consequence() == Consequence::Unsatisfiable {
                decisions.remove(rule.trigger(), rule.trigger_value());
            }
        }
        if (0..self.problem.num_variables()).any(|var| decisions.domain(var).is_empty()) {
            return None;
        }

        let queue = (0..self.problem.num_variables()).collect();
        if self.propagate(&mut decisions, queue) {
            Some(decisions)
        } else {
            None
        }
    }

    /// Run rules to a fixpoint; false when some domain becomes empty.
    fn propagate(&self, decisions: &mut Decisions, mut queue: VecDeque<VarId>) -> bool {
        let mut queued = vec![false; self.problem.num_variables()];
        for &var in &queue {
            queued[var] = true;
        }

        while let Some(var) = queue.pop_front() {
            queued[var] = false;
            let mut changed = Vec::new();

            // Forward: a fixed trigger forces its consequence
            if let Some(value) = decisions.value(var) {
                for &id in self.problem.rules_triggered_by(var) {
                    let rule = self.problem.rule(id);
                    if rule.trigger_value() != value {
                        continue;
                    }
                    match rule.consequence() {
                        Consequence::Unsatisfiable => return false,
                        Consequence::Within { target, allowed } => {
                            if decisions.restrict(target, allowed) {
                                changed.push(target);
                            }
                        }
                    }
                }
            }

            // Backward: a consequence that can no longer hold rules out its trigger
            for &id in self.problem.rules_targeting(var) {
                let rule = self.problem.rule(id);
                if let Consequence::Within { target, allowed } = rule.consequence() {
                    if !decisions.domain(target).intersects(allowed)
                        && decisions.remove(rule.trigger(), rule.trigger_value())
                    {
                        changed.push(rule.trigger());
                    }
                }
            }

            for var in changed {
                if decisions.domain(var).is_empty() {
                    return false;
                }
                if !queued[var] {
                    queued[var] = true;
                    queue.push_back(var);
                }
            }
        }

        true
    }

    fn select_variable(&self, decisions: &Decisions) -> Option<VarId> {
        (0..self.problem.num_variables())
            .filter(|&var| !decisions.is_assigned(var))
            .min_by_key(|&var| (decisions.domain(var).len(), var))
    }

    fn search(
        &mut self,
        decisions: &mut Decisions,
        on_solution: &mut dyn FnMut(&[usize]) -> Flow,
    ) -> Result<Flow, SearchError> {
        let Some(var) = self.select_variable(decisions) else {
            let Some(assignment) = decisions.assignment() else {
                return Ok(Flow::Continue);
            };
            debug_assert!(self.problem.is_satisfied_by(&assignment));
            self.stats.solutions += 1;
            return Ok(on_solution(&assignment));
        };

        let level = decisions.level();
        for value in self.policy.select_preferred(decisions.domain(var)) {
            self.tick()?;
            trace!(
                "Trying {} = {} at level {}",
                self.problem.variable(var).name(),
                value,
                level + 1
            );

            decisions.increment_level();
            let flow = if decisions.decide(var, value) && self.propagate(decisions, VecDeque::from([var])) {
                self.search(decisions, on_solution)
            } else {
                self.stats.failures += 1;
                Ok(Flow::Continue)
            };
            decisions.revert_to_level(level);

            if flow? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }

    fn tick(&mut self) -> Result<(), SearchError> {
        self.stats.nodes += 1;
        let over_nodes = self.limits.max_nodes.is_some_and(|max| self.stats.nodes > max);
        let over_time = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_nodes || over_time {
            return Err(SearchError::BudgetExceeded {
                nodes: self.stats.nodes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{IndexRange, Rule};

    /// A in {0,1}, B in {0,1}; A=0 requires B=1, A=1 requires B=0
    fn seesaw() -> VersionProblem {
        let mut problem = VersionProblem::new();
        let a = problem.add_variable("A", IndexRange::new(0, 1));
        let b = problem.add_variable("B", IndexRange::new(0, 1));
        problem.add_variable("__root__", IndexRange::singleton(0));
        problem.add_rule(Rule::requires(a, 0, b, IndexRange::singleton(1)));
        problem.add_rule(Rule::requires(a, 1, b, IndexRange::singleton(0)));
        problem
    }

    /// `width` independent variables with `depth` values each
    fn grid(width: usize, depth: usize) -> VersionProblem {
        let mut problem = VersionProblem::new();
        for i in 0..width {
            problem.add_variable(format!("p{i}"), IndexRange::new(0, depth - 1));
        }
        problem
    }

    #[test]
    fn test_solve_prefers_highest() {
        let problem = seesaw();
        let policy = Policy::new();
        let assignment = Solver::new(&problem, &policy).solve().unwrap().unwrap();
        assert_eq!(assignment, vec![1, 0, 0]);
    }

    #[test]
    fn test_solve_prefers_lowest() {
        let problem = seesaw();
        let policy = Policy::new().prefer_lowest(true);
        let assignment = Solver::new(&problem, &policy).solve().unwrap().unwrap();
        assert_eq!(assignment, vec![0, 1, 0]);
    }

    #[test]
    fn test_solve_infeasible_by_propagation() {
        let mut problem = seesaw();
        problem.add_rule(Rule::root_require(2, 0, 0, IndexRange::singleton(0)));
        problem.add_rule(Rule::root_require(2, 1, 1, IndexRange::singleton(0)));

        let policy = Policy::new();
        let mut solver = Solver::new(&problem, &policy);
        assert_eq!(solver.solve().unwrap(), None);
        assert_eq!(solver.stats().nodes, 0);
    }

    #[test]
    fn test_forbidden_value_is_never_chosen() {
        let mut problem = grid(1, 3);
        problem.add_rule(Rule::forbids(0, 2));
        let policy = Policy::new();
        assert_eq!(Solver::new(&problem, &policy).solve().unwrap(), Some(vec![1]));

        problem.add_rule(Rule::forbids(0, 1));
        problem.add_rule(Rule::forbids(0, 0));
        assert_eq!(Solver::new(&problem, &policy).solve().unwrap(), None);
    }

    #[test]
    fn test_contrapositive_propagation() {
        // A=1 and A=2 need B=1, B=1 needs C=0, and the root pins C to 1
        let mut problem = VersionProblem::new();
        let a = problem.add_variable("A", IndexRange::new(0, 2));
        let b = problem.add_variable("B", IndexRange::new(0, 1));
        let c = problem.add_variable("C", IndexRange::new(0, 1));
        let root = problem.add_variable("__root__", IndexRange::singleton(0));
        problem.add_rule(Rule::requires(a, 1, b, IndexRange::singleton(1)));
        problem.add_rule(Rule::requires(a, 2, b, IndexRange::singleton(1)));
        problem.add_rule(Rule::requires(b, 1, c, IndexRange::singleton(0)));
        problem.add_rule(Rule::root_require(root, 0, c, IndexRange::singleton(1)));

        let policy = Policy::new();
        let assignment = Solver::new(&problem, &policy).solve().unwrap().unwrap();
        assert_eq!(assignment, vec![0, 0, 1, 0]);
        assert!(problem.is_satisfied_by(&assignment));
    }

    #[test]
    fn test_optimize_finds_best() {
        let problem = grid(2, 3);
        let policy = Policy::new();

        // Best is p0 = 1 first, then the smallest p1
        let (assignment, score) = Solver::new(&problem, &policy)
            .optimize(
                |a| Score::new(vec![-((a[0] as f64) - 1.0).abs(), -(a[1] as f64)]),
                None,
            )
            .unwrap()
            .unwrap();
        assert_eq!(assignment, vec![1, 0]);
        assert_eq!(score, Score::new(vec![0.0, 0.0]));
    }

    #[test]
    fn test_optimize_ties_keep_first_found() {
        let problem = grid(2, 2);
        let policy = Policy::new();
        let (assignment, _) = Solver::new(&problem, &policy)
            .optimize(|_| Score::from(0.0), None)
            .unwrap()
            .unwrap();
        assert_eq!(assignment, vec![1, 1]);
    }

    #[test]
    fn test_optimize_floor_rejects_worse() {
        let problem = grid(1, 2);
        let policy = Policy::new();
        let floor = Score::from(10.0);
        let result = Solver::new(&problem, &policy)
            .optimize(|a| Score::from(a[0] as f64), Some(&floor))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_budget_exceeded_without_candidate() {
        let problem = grid(3, 3);
        let policy = Policy::new();
        let limits = SearchLimits::unlimited().max_nodes(1);

        let err = Solver::new(&problem, &policy).with_limits(limits).solve().unwrap_err();
        assert_eq!(err, SearchError::BudgetExceeded { nodes: 2 });
    }

    #[test]
    fn test_budget_exceeded_returns_incumbent() {
        let problem = grid(3, 3);
        let policy = Policy::new();
        let limits = SearchLimits::unlimited().max_nodes(5);

        let mut solver = Solver::new(&problem, &policy).with_limits(limits);
        let (assignment, _) = solver
            .optimize(|a| Score::from(-(a.iter().sum::<usize>() as f64)), None)
            .unwrap()
            .unwrap();
        assert_eq!(assignment.len(), 3);
        assert_eq!(solver.stats().nodes, 6);
    }

    #[test]
    fn test_timeout_without_candidate() {
        let problem = grid(3, 3);
        let policy = Policy::new();
        let limits = SearchLimits::unlimited().timeout(Duration::ZERO);

        let err = Solver::new(&problem, &policy).with_limits(limits).solve().unwrap_err();
        assert_eq!(err, SearchError::BudgetExceeded { nodes: 1 });
    }

    #[test]
    fn test_timeout_before_first_candidate_in_optimize() {
        let problem = grid(2, 2);
        let policy = Policy::new();
        let limits = SearchLimits::unlimited().timeout(Duration::ZERO);

        let err = Solver::new(&problem, &policy)
            .with_limits(limits)
            .optimize(|_| Score::from(0.0), None)
            .unwrap_err();
        assert_eq!(err, SearchError::BudgetExceeded { nodes: 1 });
    }
}
