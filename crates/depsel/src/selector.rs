//! Selector: solve a dependency graph for a list of solution constraints

use std::collections::VecDeque;
use std::fmt;
use std::ops::Index;

use log::{debug, info};
use serde::{Serialize, Serializer};

use depsel_semver::{Version, VersionConstraint};

use crate::config::SolverConfig;
use crate::error::{ConflictReason, GraphError, SolutionConstraintError, SolveError};
use crate::graph::DependencyGraph;
use crate::objective::{Objective, Score};
use crate::solver::{ConflictDiagnoser, Diagnosis, Encoding, RuleGenerator, Solver};

/// An externally imposed requirement: `name` must be selected within
/// `version_constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionConstraint {
    pub name: String,
    pub version_constraint: VersionConstraint,
}

impl SolutionConstraint {
    pub fn new(name: impl Into<String>, version_constraint: VersionConstraint) -> Self {
        Self {
            name: name.into(),
            version_constraint,
        }
    }

    /// Require the package at any version
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, VersionConstraint::any())
    }

    /// Parse `"NAME"` or `"NAME CONSTRAINT"`, e.g. `"B = 1.0.0"` or `"C>=2"`
    pub fn parse(input: &str) -> Result<Self, SolutionConstraintError> {
        let input = input.trim();
        let split = input
            .find(|c: char| c.is_whitespace() || "<>=~!^".contains(c))
            .unwrap_or(input.len());
        let (name, constraint) = input.split_at(split);

        if name.is_empty() {
            return Err(SolutionConstraintError::MissingName {
                input: input.to_string(),
            });
        }
        Ok(Self::new(name, VersionConstraint::parse(constraint)?))
    }
}

impl fmt::Display for SolutionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_constraint.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.version_constraint)
        }
    }
}

/// One package of a [`Solution`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvedPackage {
    pub package_name: String,
    #[serde(serialize_with = "serialize_version")]
    pub version: Version,
}

impl SolvedPackage {
    pub fn new(package_name: impl Into<String>, version: Version) -> Self {
        Self {
            package_name: package_name.into(),
            version,
        }
    }
}

fn serialize_version<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(version)
}

/// Selected versions in package declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Solution(Vec<SolvedPackage>);

impl Solution {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SolvedPackage> {
        self.0.iter()
    }

    /// The version selected for `name`
    pub fn get(&self, name: &str) -> Option<&Version> {
        self.0
            .iter()
            .find(|solved| solved.package_name == name)
            .map(|solved| &solved.version)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Index<usize> for Solution {
    type Output = SolvedPackage;

    fn index(&self, index: usize) -> &SolvedPackage {
        &self.0[index]
    }
}

impl FromIterator<SolvedPackage> for Solution {
    fn from_iter<I: IntoIterator<Item = SolvedPackage>>(iter: I) -> Self {
        Solution(iter.into_iter().collect())
    }
}

impl IntoIterator for Solution {
    type Item = SolvedPackage;
    type IntoIter = std::vec::IntoIter<SolvedPackage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Solution {
    type Item = &'a SolvedPackage;
    type IntoIter = std::slice::Iter<'a, SolvedPackage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Chooses one version per package.
///
/// The selector owns the graph and freezes it on construction, so package
/// domains stay fixed for every solve.
#[derive(Debug, Clone)]
pub struct Selector {
    graph: DependencyGraph,
    config: SolverConfig,
}

impl Selector {
    pub fn new(mut graph: DependencyGraph) -> Result<Self, GraphError> {
        graph.freeze()?;
        Ok(Self {
            graph,
            config: SolverConfig::default(),
        })
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Find any solution satisfying the graph and `constraints`
    pub fn find_solution(&self, constraints: &[SolutionConstraint]) -> Result<Solution, SolveError> {
        info!("Solving {} solution constraints", constraints.len());
        let encoding = RuleGenerator::new(&self.graph).generate(constraints)?;

        let policy = self.config.policy();
        let assignment = Solver::new(&encoding.problem, &policy)
            .with_limits(self.config.limits())
            .solve()?;

        match assignment {
            Some(assignment) => {
                let solution = self.decode(&encoding, constraints, &assignment);
                info!("Found a solution with {} packages", solution.len());
                Ok(solution)
            }
            None => Err(self.diagnose(&encoding, constraints)),
        }
    }

    /// Find the solution with the best `objective` score.
    ///
    /// The objective sees the same solution the caller would receive. When
    /// `floor` is given, the result must score strictly better than it.
    pub fn find_optimal_solution(
        &self,
        constraints: &[SolutionConstraint],
        objective: &dyn Objective,
        floor: Option<&Score>,
    ) -> Result<Solution, SolveError> {
        info!("Optimizing over {} solution constraints", constraints.len());
        let encoding = RuleGenerator::new(&self.graph).generate(constraints)?;

        let policy = self.config.policy();
        let best = Solver::new(&encoding.problem, &policy)
            .with_limits(self.config.limits())
            .optimize(
                |assignment| objective.score(&self.decode(&encoding, constraints, assignment)),
                floor,
            )?;

        match best {
            Some((assignment, score)) => {
                info!("Best solution scores {:?}", score.values());
                Ok(self.decode(&encoding, constraints, &assignment))
            }
            None => Err(self.diagnose(&encoding, constraints)),
        }
    }

    /// Check that the graph has a solution before any solution constraint
    pub fn check(&self) -> Result<(), SolveError> {
        let encoding = RuleGenerator::new(&self.graph).generate(&[])?;
        let policy = self.config.policy();
        let feasible = Solver::new(&encoding.problem, &policy)
            .with_limits(self.config.limits())
            .solve()?
            .is_some();

        if feasible {
            Ok(())
        } else {
            Err(SolveError::InconsistentGraph)
        }
    }

    fn diagnose(&self, encoding: &Encoding, constraints: &[SolutionConstraint]) -> SolveError {
        let policy = self.config.policy();
        let diagnosis = ConflictDiagnoser::new(&encoding.problem, &policy)
            .with_limits(self.config.limits())
            .diagnose();

        match diagnosis {
            Ok(Some(Diagnosis::InconsistentGraph)) => SolveError::InconsistentGraph,
            Ok(Some(Diagnosis::Culprit(index))) => SolveError::NoSolution {
                constraint: constraints[index].clone(),
                reason: ConflictReason::Conflict,
            },
            // Feasible without a solution means nothing beat the floor
            Ok(None) => SolveError::BelowFloor,
            Err(err) => err.into(),
        }
    }

    /// Map an assignment back to versions, in declaration order
    fn decode(&self, encoding: &Encoding, constraints: &[SolutionConstraint], assignment: &[usize]) -> Solution {
        let chosen: Vec<Option<&Version>> = self
            .graph
            .packages()
            .zip(&encoding.package_vars)
            .map(|(package, var)| {
                let var = (*var)?;
                package.domain()?.version_at(assignment[var])
            })
            .collect();

        let keep = if self.config.prune_unreachable {
            self.reachable(constraints, &chosen)
        } else {
            chosen.iter().map(Option::is_some).collect()
        };

        self.graph
            .packages()
            .zip(chosen)
            .zip(keep)
            .filter_map(|((package, version), keep)| match (version, keep) {
                (Some(version), true) => Some(SolvedPackage::new(package.name(), *version)),
                _ => None,
            })
            .collect()
    }

    /// Packages reachable from the constraint targets through the
    /// dependencies of the chosen versions
    fn reachable(&self, constraints: &[SolutionConstraint], chosen: &[Option<&Version>]) -> Vec<bool> {
        let mut seen = vec![false; chosen.len()];
        let mut queue: VecDeque<usize> = constraints
            .iter()
            .filter_map(|constraint| self.graph.index_of(&constraint.name))
            .collect();

        while let Some(index) = queue.pop_front() {
            if seen[index] {
                continue;
            }
            seen[index] = true;

            let package_version = self
                .graph
                .get_index(index)
                .zip(chosen[index])
                .and_then(|(package, version)| package.version(version));
            let Some(package_version) = package_version else {
                continue;
            };

            for dependency in package_version.dependencies() {
                if let Some(target) = self.graph.index_of(dependency.target()) {
                    if !seen[target] {
                        queue.push_back(target);
                    }
                }
            }
        }

        debug!(
            "{} of {} packages reachable from the solution constraints",
            seen.iter().filter(|&&s| s).count(),
            seen.len()
        );
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"[
        {"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}},
        {"key": ["A", "2.0.0"], "value": {"B": "= 1.0.0", "C": "= 1.0.0"}},
        {"key": ["B", "1.0.0"], "value": {}},
        {"key": ["B", "2.0.0"], "value": {}},
        {"key": ["C", "1.0.0"], "value": {}}
    ]"#;

    fn selector(json: &str) -> Selector {
        Selector::new(DependencyGraph::from_json_str(json).unwrap()).unwrap()
    }

    fn pairs(solution: &Solution) -> Vec<(String, String)> {
        solution
            .iter()
            .map(|s| (s.package_name.clone(), s.version.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_solution_constraint() {
        let c = SolutionConstraint::parse("B = 1.0.0").unwrap();
        assert_eq!(c.name, "B");
        assert_eq!(c.version_constraint.to_string(), "= 1.0.0");
        assert_eq!(c.to_string(), "B (= 1.0.0)");

        let c = SolutionConstraint::parse("  A ").unwrap();
        assert_eq!(c, SolutionConstraint::any("A"));
        assert_eq!(c.to_string(), "A");

        let c = SolutionConstraint::parse("C>=2").unwrap();
        assert_eq!(c.name, "C");
        assert_eq!(c.version_constraint.to_string(), ">= 2");

        assert!(matches!(
            SolutionConstraint::parse(">= 1.0"),
            Err(SolutionConstraintError::MissingName { .. })
        ));
        assert!(matches!(
            SolutionConstraint::parse("A = x"),
            Err(SolutionConstraintError::Constraint(_))
        ));
    }

    #[test]
    fn test_solution_serializes_as_pairs() {
        let solution: Solution = [SolvedPackage::new("A", Version::parse("2.0").unwrap())]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&solution).unwrap();
        assert_eq!(json, r#"[{"package_name":"A","version":"2.0"}]"#);
        assert_eq!(solution[0].package_name, "A");
    }

    #[test]
    fn test_new_freezes_graph() {
        let selector = selector(SIMPLE);
        assert!(selector.graph().is_frozen());

        let mut graph = DependencyGraph::from_json_str(r#"[{"key": ["A", "1"], "value": {}}]"#).unwrap();
        graph
            .package("A")
            .add_version(Version::parse("2").unwrap())
            .unwrap()
            .add_dependency("nope", VersionConstraint::any());
        assert!(matches!(
            Selector::new(graph),
            Err(GraphError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_unreachable_packages_are_pruned() {
        let selector = selector(SIMPLE);
        let constraints = [SolutionConstraint::any("A"), SolutionConstraint::parse("B = 2.0.0").unwrap()];

        let solution = selector.find_solution(&constraints).unwrap();
        assert_eq!(
            pairs(&solution),
            vec![("A".into(), "1.0.0".into()), ("B".into(), "2.0.0".into())]
        );

        let config = SolverConfig {
            prune_unreachable: false,
            ..SolverConfig::default()
        };
        let solution = selector.with_config(config).find_solution(&constraints).unwrap();
        assert_eq!(solution.len(), 3);
        assert_eq!(solution.get("C").unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn test_no_constraints_selects_nothing() {
        let selector = selector(SIMPLE);
        assert!(selector.find_solution(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_check() {
        assert!(selector(SIMPLE).check().is_ok());

        let broken = selector(
            r#"[
                {"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}},
                {"key": ["B", "1.0.0"], "value": {}}
            ]"#,
        );
        assert!(matches!(broken.check(), Err(SolveError::InconsistentGraph)));
    }

    #[test]
    fn test_inconsistent_graph_reported() {
        let selector = selector(
            r#"[
                {"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}},
                {"key": ["B", "1.0.0"], "value": {}}
            ]"#,
        );
        let err = selector.find_solution(&[SolutionConstraint::any("B")]).unwrap_err();
        assert!(matches!(err, SolveError::InconsistentGraph));
        assert_eq!(err.unsatisfiable_constraint(), None);
    }

    #[test]
    fn test_floor_not_beaten() {
        let selector = selector(SIMPLE);
        let objective = |_: &Solution| Score::from(0.0);
        let floor = Score::from(1.0);

        let err = selector
            .find_optimal_solution(&[SolutionConstraint::any("A")], &objective, Some(&floor))
            .unwrap_err();
        assert!(matches!(err, SolveError::BelowFloor));
    }

    #[test]
    fn test_budget_exceeded_is_not_infeasible() {
        let config = SolverConfig {
            max_nodes: Some(0),
            ..SolverConfig::default()
        };
        let selector = selector(SIMPLE).with_config(config);

        let err = selector.find_solution(&[SolutionConstraint::any("A")]).unwrap_err();
        assert!(matches!(err, SolveError::BudgetExceeded { .. }));
    }

    #[test]
    fn test_timeout_is_not_infeasible() {
        let config = SolverConfig {
            timeout_ms: Some(0),
            ..SolverConfig::default()
        };
        let selector = selector(SIMPLE).with_config(config);

        let err = selector.find_solution(&[SolutionConstraint::any("A")]).unwrap_err();
        assert!(matches!(err, SolveError::BudgetExceeded { nodes: 1 }));
    }

    #[test]
    fn test_solution_constraints_compare_by_interval() {
        let minor_level = SolutionConstraint::parse("A ~> 1.2").unwrap();
        let patch_level = SolutionConstraint::parse("A ~> 1.2.0").unwrap();
        assert_ne!(minor_level, patch_level);
        assert_eq!(minor_level, SolutionConstraint::parse("A~>1.2").unwrap());
    }
}
