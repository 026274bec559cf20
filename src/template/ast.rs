// SPDX-License-Identifier: MIT

//! Abstract syntax tree for sandboxed template expressions

/// A template expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Context lookup with member/index access and whitelisted methods
    Path(Vec<PathSegment>),
    /// Comparison expression: left op right
    Compare {
        left: Box<Expression>,
        op: CompareOp,
        right: Box<Expression>,
    },
    /// Logical AND
    And(Box<Expression>, Box<Expression>),
    /// Logical OR
    Or(Box<Expression>, Box<Expression>),
    /// Logical NOT
    Not(Box<Expression>),
}

/// One step of a path expression
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Root identifier or `.member` access
    Member(String),
    /// `[index]` or `['key']` access
    Index(Literal),
    /// Whitelisted method call such as `.strip()`
    Method(Method),
}

/// Whitelisted string operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Trim surrounding whitespace
    Strip,
    /// Lower-case
    Lower,
    /// Upper-case
    Upper,
    /// String/array/object length
    Length,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strip" => Some(Method::Strip),
            "lower" => Some(Method::Lower),
            "upper" => Some(Method::Upper),
            "length" => Some(Method::Length),
            _ => None,
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// membership test
    In,
    /// negated membership test
    NotIn,
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::In => write!(f, "in"),
            CompareOp::NotIn => write!(f, "not in"),
        }
    }
}
