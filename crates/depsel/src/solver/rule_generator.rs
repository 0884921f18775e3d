use log::debug;

use super::domain::IndexRange;
use super::problem::VersionProblem;
use super::rule::{Rule, VarId};
use crate::error::{ConflictReason, GraphError, SolveError};
use crate::graph::DependencyGraph;
use crate::selector::SolutionConstraint;

/// Name of the synthetic variable the solution constraints hang off
pub const ROOT_VARIABLE: &str = "__root__";

/// A graph and its solution constraints encoded as a [`VersionProblem`]
#[derive(Debug, Clone)]
pub struct Encoding {
    pub problem: VersionProblem,
    /// The synthetic root variable, fixed to 0
    pub root: VarId,
    /// Variable of each package by declaration index; `None` for packages
    /// without versions
    pub package_vars: Vec<Option<VarId>>,
}

/// Generates implication rules from a frozen dependency graph.
///
/// - Variables: one per package with at least one version, domain `0..len`
/// - Package requirements: if A is at index i, then B lies in a subrange
/// - Unsatisfiable requirements: A may never be at index i
/// - Root requirements: the root requires each solution constraint
pub struct RuleGenerator<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> RuleGenerator<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Encode the graph plus `constraints`, in order.
    ///
    /// A solution constraint that matches nothing fails here, before any
    /// search, naming that constraint.
    pub fn generate(self, constraints: &[SolutionConstraint]) -> Result<Encoding, SolveError> {
        let mut problem = VersionProblem::new();
        let package_vars = self.add_variables(&mut problem)?;
        let root = problem.add_variable(ROOT_VARIABLE, IndexRange::singleton(0));

        let mut encoding = Encoding {
            problem,
            root,
            package_vars,
        };
        self.add_package_rules(&mut encoding)?;
        self.add_root_require_rules(&mut encoding, constraints)?;

        debug!(
            "Encoded {} variables and {} rules ({} from solution constraints)",
            encoding.problem.num_variables(),
            encoding.problem.rules().len(),
            encoding.problem.root_rule_count()
        );
        Ok(encoding)
    }

    fn add_variables(&self, problem: &mut VersionProblem) -> Result<Vec<Option<VarId>>, GraphError> {
        let mut vars = Vec::with_capacity(self.graph.len());
        for package in self.graph.packages() {
            let domain = package.domain().ok_or_else(|| GraphError::NotFrozen {
                package: package.name().to_string(),
            })?;
            vars.push(domain.range().map(|range| problem.add_variable(package.name(), range)));
        }
        Ok(vars)
    }

    /// One rule per dependency edge of every version
    fn add_package_rules(&self, encoding: &mut Encoding) -> Result<(), GraphError> {
        for (index, package) in self.graph.packages().enumerate() {
            let Some(var) = encoding.package_vars[index] else {
                continue;
            };
            let domain = package.domain().ok_or_else(|| GraphError::NotFrozen {
                package: package.name().to_string(),
            })?;

            for package_version in package.versions() {
                let Some(value) = domain.index_of(package_version.version()) else {
                    continue;
                };

                for dependency in package_version.dependencies() {
                    let target_index = self.graph.index_of(dependency.target()).ok_or_else(|| {
                        GraphError::UnknownDependency {
                            package: package.name().to_string(),
                            version: package_version.version().to_string(),
                            target: dependency.target().to_string(),
                        }
                    })?;
                    let target = self.graph.get_index(target_index).and_then(|target| {
                        let target_var = encoding.package_vars[target_index]?;
                        let allowed = target.domain()?.subrange_for(dependency.constraint()).ok()?;
                        Some((target_var, allowed))
                    });

                    let rule = match target {
                        Some((target_var, allowed)) => Rule::requires(var, value, target_var, allowed),
                        None => {
                            debug!(
                                "{} {} requires {} {}, which matches no version; excluding it",
                                package.name(),
                                package_version.version(),
                                dependency.target(),
                                dependency.constraint()
                            );
                            Rule::forbids(var, value)
                        }
                    };
                    encoding.problem.add_rule(rule);
                }
            }
        }
        Ok(())
    }

    fn add_root_require_rules(
        &self,
        encoding: &mut Encoding,
        constraints: &[SolutionConstraint],
    ) -> Result<(), SolveError> {
        for (index, constraint) in constraints.iter().enumerate() {
            let no_solution = |reason| SolveError::NoSolution {
                constraint: constraint.clone(),
                reason,
            };

            let package_index = self
                .graph
                .index_of(&constraint.name)
                .ok_or_else(|| no_solution(ConflictReason::UnknownPackage))?;
            let target = encoding.package_vars[package_index]
                .ok_or_else(|| no_solution(ConflictReason::NoMatchingVersion))?;
            let allowed = self
                .graph
                .get_index(package_index)
                .and_then(|package| package.domain())
                .and_then(|domain| domain.subrange_for(&constraint.version_constraint).ok())
                .ok_or_else(|| no_solution(ConflictReason::NoMatchingVersion))?;

            encoding
                .problem
                .add_rule(Rule::root_require(encoding.root, index, target, allowed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Consequence, RuleType};

    fn graph(json: &str) -> DependencyGraph {
        let mut graph = DependencyGraph::from_json_str(json).unwrap();
        graph.freeze().unwrap();
        graph
    }

    fn simple() -> DependencyGraph {
        graph(
            r#"[
                {"key": ["A", "1.0.0"], "value": {"B": "= 2.0.0"}},
                {"key": ["A", "2.0.0"], "value": {"B": "= 1.0.0", "C": "= 1.0.0"}},
                {"key": ["B", "1.0.0"], "value": {}},
                {"key": ["B", "2.0.0"], "value": {}},
                {"key": ["C", "1.0.0"], "value": {}}
            ]"#,
        )
    }

    fn constraint(s: &str) -> SolutionConstraint {
        SolutionConstraint::parse(s).unwrap()
    }

    #[test]
    fn test_variables_follow_declaration_order() {
        let graph = simple();
        let encoding = RuleGenerator::new(&graph).generate(&[]).unwrap();
        let problem = &encoding.problem;

        let names: Vec<_> = problem.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["A", "B", "C", ROOT_VARIABLE]);
        assert_eq!(encoding.root, 3);
        assert_eq!(encoding.package_vars, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(problem.variable(0).domain(), IndexRange::new(0, 1));
        assert_eq!(problem.variable(3).domain(), IndexRange::singleton(0));
    }

    #[test]
    fn test_package_rules() {
        let graph = simple();
        let encoding = RuleGenerator::new(&graph).generate(&[]).unwrap();
        let rules = encoding.problem.rules();

        assert_eq!(rules.len(), 3);
        assert!(rules.iter().all(|r| r.rule_type() == RuleType::PackageRequires));
        assert_eq!(rules[0], Rule::requires(0, 0, 1, IndexRange::singleton(1)));
        assert_eq!(rules[1], Rule::requires(0, 1, 1, IndexRange::singleton(0)));
        assert_eq!(rules[2], Rule::requires(0, 1, 2, IndexRange::singleton(0)));
    }

    #[test]
    fn test_root_rules_keep_order() {
        let graph = simple();
        let constraints = [constraint("B = 1.0.0"), constraint("A")];
        let encoding = RuleGenerator::new(&graph).generate(&constraints).unwrap();

        let roots: Vec<_> = encoding
            .problem
            .rules()
            .iter()
            .filter(|r| r.rule_type() == RuleType::RootRequire)
            .collect();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].constraint_index(), Some(0));
        assert_eq!(
            roots[0].consequence(),
            Consequence::Within {
                target: 1,
                allowed: IndexRange::singleton(0)
            }
        );
        assert_eq!(roots[1].target(), Some(0));
    }

    #[test]
    fn test_unmatched_edge_forbids_version() {
        let graph = graph(
            r#"[
                {"key": ["A", "1.0.0"], "value": {"B": ">= 5.0"}},
                {"key": ["A", "2.0.0"], "value": {"Z": ""}},
                {"key": ["B", "1.0.0"], "value": {}}
            ]"#,
        );
        let encoding = RuleGenerator::new(&graph).generate(&[]).unwrap();

        assert_eq!(encoding.package_vars, vec![Some(0), Some(1), None]);
        assert_eq!(encoding.problem.rules(), &[Rule::forbids(0, 0), Rule::forbids(0, 1)]);
    }

    #[test]
    fn test_unknown_constraint_package() {
        let graph = simple();
        let err = RuleGenerator::new(&graph)
            .generate(&[constraint("A"), constraint("Q")])
            .unwrap_err();
        assert!(matches!(
            err,
            SolveError::NoSolution { ref constraint, reason: ConflictReason::UnknownPackage }
                if constraint.name == "Q"
        ));
    }

    #[test]
    fn test_unmatched_constraint_fails_at_encode_time() {
        let graph = simple();
        let err = RuleGenerator::new(&graph)
            .generate(&[constraint("B > 2.0.0"), constraint("A = 9.0")])
            .unwrap_err();
        assert!(matches!(
            err,
            SolveError::NoSolution { ref constraint, reason: ConflictReason::NoMatchingVersion }
                if constraint.name == "B"
        ));
    }

    #[test]
    fn test_unfrozen_graph() {
        let graph = DependencyGraph::from_json_str(r#"[{"key": ["A", "1.0.0"]}]"#).unwrap();
        let err = RuleGenerator::new(&graph).generate(&[]).unwrap_err();
        assert!(matches!(err, SolveError::Graph(GraphError::NotFrozen { .. })));
    }
}
