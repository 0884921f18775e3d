use super::domain::IndexRange;
use super::rule::{Rule, RuleType, VarId};

/// An integer variable of the problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    domain: IndexRange,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> IndexRange {
        self.domain
    }
}

/// A constraint satisfaction problem over dense version indices.
///
/// Rules are indexed both by the variable that triggers them and by the
/// variable they restrict, which is what propagation walks.
#[derive(Debug, Clone, Default)]
pub struct VersionProblem {
    variables: Vec<Variable>,
    rules: Vec<Rule>,
    by_trigger: Vec<Vec<usize>>,
    by_target: Vec<Vec<usize>>,
}

impl VersionProblem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, domain: IndexRange) -> VarId {
        let id = self.variables.len();
        self.variables.push(Variable {
            name: name.into(),
            domain,
        });
        self.by_trigger.push(Vec::new());
        self.by_target.push(Vec::new());
        id
    }

    pub fn add_rule(&mut self, rule: Rule) -> usize {
        let id = self.rules.len();
        self.by_trigger[rule.trigger()].push(id);
        if let Some(target) = rule.target() {
            self.by_target[target].push(id);
        }
        self.rules.push(rule);
        id
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: usize) -> &Rule {
        &self.rules[id]
    }

    /// Ids of rules whose trigger is `var`
    pub fn rules_triggered_by(&self, var: VarId) -> &[usize] {
        &self.by_trigger[var]
    }

    /// Ids of rules that restrict `var`
    pub fn rules_targeting(&self, var: VarId) -> &[usize] {
        &self.by_target[var]
    }

    /// Number of root (solution constraint) rules
    pub fn root_rule_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| r.rule_type() == RuleType::RootRequire)
            .count()
    }

    /// A copy keeping only the first `keep` solution constraints
    pub fn with_root_prefix(&self, keep: usize) -> VersionProblem {
        let mut problem = VersionProblem::new();
        for variable in &self.variables {
            problem.add_variable(variable.name.clone(), variable.domain);
        }
        for rule in &self.rules {
            let kept = match rule.constraint_index() {
                Some(index) => index < keep,
                None => true,
            };
            if kept {
                problem.add_rule(rule.clone());
            }
        }
        problem
    }

    /// Check a complete assignment against every domain and rule
    pub fn is_satisfied_by(&self, assignment: &[usize]) -> bool {
        assignment.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(assignment)
                .all(|(var, &value)| var.domain.contains(value))
            && self.rules.iter().all(|rule| rule.is_satisfied_by(assignment))
    }
}
