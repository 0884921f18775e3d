use super::domain::IndexRange;

/// Index of a variable in a [`VersionProblem`](super::VersionProblem)
pub type VarId = usize;

/// Where a rule comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    /// A package version's dependency edge
    PackageRequires,
    /// A solution constraint, hung off the synthetic root variable
    RootRequire,
}

/// What must hold once a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consequence {
    /// The target variable must take a value in `allowed`
    Within { target: VarId, allowed: IndexRange },
    /// Nothing can satisfy the rule, so the trigger value is forbidden
    Unsatisfiable,
}

/// An implication constraint: "if `trigger == trigger_value`, then `consequence`".
///
/// When the trigger variable takes any other value the rule imposes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    rule_type: RuleType,
    trigger: VarId,
    trigger_value: usize,
    consequence: Consequence,
    /// Position of the solution constraint for root rules
    constraint_index: Option<usize>,
}

impl Rule {
    /// `trigger == trigger_value` implies `target` lies within `allowed`
    pub fn requires(trigger: VarId, trigger_value: usize, target: VarId, allowed: IndexRange) -> Self {
        Self {
            rule_type: RuleType::PackageRequires,
            trigger,
            trigger_value,
            consequence: Consequence::Within { target, allowed },
            constraint_index: None,
        }
    }

    /// `trigger` may never take `trigger_value`
    pub fn forbids(trigger: VarId, trigger_value: usize) -> Self {
        Self {
            rule_type: RuleType::PackageRequires,
            trigger,
            trigger_value,
            consequence: Consequence::Unsatisfiable,
            constraint_index: None,
        }
    }

    /// Solution constraint number `index`: the root requires `target` within `allowed`
    pub fn root_require(root: VarId, index: usize, target: VarId, allowed: IndexRange) -> Self {
        Self {
            rule_type: RuleType::RootRequire,
            trigger: root,
            trigger_value: 0,
            consequence: Consequence::Within { target, allowed },
            constraint_index: Some(index),
        }
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn trigger(&self) -> VarId {
        self.trigger
    }

    pub fn trigger_value(&self) -> usize {
        self.trigger_value
    }

    pub fn consequence(&self) -> Consequence {
        self.consequence
    }

    pub fn target(&self) -> Option<VarId> {
        match self.consequence {
            Consequence::Within { target, .. } => Some(target),
            Consequence::Unsatisfiable => None,
        }
    }

    pub fn constraint_index(&self) -> Option<usize> {
        self.constraint_index
    }

    /// Check the rule against a complete assignment
    pub fn is_satisfied_by(&self, assignment: &[usize]) -> bool {
        if assignment[self.trigger] != self.trigger_value {
            return true;
        }
        match self.consequence {
            Consequence::Within { target, allowed } => allowed.contains(assignment[target]),
            Consequence::Unsatisfiable => false,
        }
    }
}
