use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The closed set of operators a curried predicate may carry. An
/// indexer that cannot evaluate a given operator for its value kind
/// returns `Error::UnsupportedOperator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Matches,
    Prefix,
    Suffix,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Op::Eq => "==",
            Op::NotEq => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::In => "in",
            Op::NotIn => "not in",
            Op::Matches => "matches",
            Op::Prefix => "prefix",
            Op::Suffix => "suffix",
        };
        write!(f, "{s}")
    }
}

/// A predicate whose extractor has already been resolved to a specific
/// (type, offset) — i.e. a specific indexer — leaving only the operator
/// and the constant to compare against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriedPredicate {
    pub op: Op,
    pub value: Value,
}

impl CurriedPredicate {
    pub fn new(op: Op, value: Value) -> Self {
        Self { op, value }
    }
}
