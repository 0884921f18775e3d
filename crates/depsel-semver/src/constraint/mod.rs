//! Version constraint operators and the constraint type

mod constraint;

use std::fmt;
use std::str::FromStr;

pub use constraint::{ConstraintError, VersionConstraint};

/// Comparison operator of a [`VersionConstraint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Unconstrained, every version matches
    Any,
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// Approximately compatible (`~>`)
    Pessimistic,
}

impl Operator {
    /// Operator symbols accepted by the parser
    pub fn supported_operators() -> &'static [&'static str] {
        &["=", ">", ">=", "<", "<=", "~>"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Any => "*",
            Operator::Equal => "=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(Operator::Equal),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            "~>" => Ok(Operator::Pessimistic),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
