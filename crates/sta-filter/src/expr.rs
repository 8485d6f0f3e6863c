//! Parsed query-expression tree.
//!
//! The request layer hands these trees in already parsed; this crate never
//! sees filter text. The `Display` impl renders an OData-like fragment used in
//! error messages.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sta_common::Geometry;
use std::fmt;

use crate::error::{FilterError, FilterResult};

/// A literal value in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    TimeOfDay(NaiveTime),
    Geometry(Geometry),
}

/// Binary operators: comparisons, boolean connectives and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn keyword(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaKind {
    Any,
    All,
}

/// A node of the query-expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Property path, one element per `/`-separated segment.
    Member(Vec<String>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Method {
        name: String,
        args: Vec<Expr>,
    },
    Lambda {
        kind: LambdaKind,
        path: Vec<String>,
        variable: String,
        body: Box<Expr>,
    },
}

impl Expr {
    /// Property reference from a `/`-separated path such as `Datastream/name`.
    pub fn member(path: &str) -> Self {
        Expr::Member(path.split('/').map(str::to_string).collect())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal(Literal::Integer(n))
    }

    pub fn decimal(n: f64) -> Self {
        Expr::Literal(Literal::Decimal(n))
    }

    pub fn boolean(b: bool) -> Self {
        Expr::Literal(Literal::Boolean(b))
    }

    pub fn datetime(dt: DateTime<Utc>) -> Self {
        Expr::Literal(Literal::DateTime(dt))
    }

    pub fn geometry(g: Geometry) -> Self {
        Expr::Literal(Literal::Geometry(g))
    }

    /// Geometry literal from WKT text, as written in `geography'...'`.
    pub fn geography(wkt: &str) -> FilterResult<Self> {
        Geometry::from_wkt(wkt)
            .map(Expr::geometry)
            .map_err(|e| FilterError::invalid(format!("geography'{}'", wkt), e.to_string()))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Method {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Decimal(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Literal::Date(d) => write!(f, "{}", d),
            Literal::TimeOfDay(t) => write!(f, "{}", t),
            Literal::Geometry(g) => write!(f, "geography'{}'", g.type_name()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => lit.fmt(f),
            Expr::Member(path) => f.write_str(&path.join("/")),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.keyword(), right)
            }
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "not {}", operand),
            Expr::Unary {
                op: UnaryOp::Minus,
                operand,
            } => write!(f, "-{}", operand),
            Expr::Method { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str(")")
            }
            Expr::Lambda {
                kind,
                path,
                variable,
                body,
            } => {
                let kw = match kind {
                    LambdaKind::Any => "any",
                    LambdaKind::All => "all",
                };
                write!(f, "{}/{}({}: {})", path.join("/"), kw, variable, body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geography_literal_from_wkt() {
        assert_eq!(
            Expr::geography("SRID=4326;POINT(7 51)").unwrap(),
            Expr::geometry(Geometry::point(7.0, 51.0))
        );
        let err = Expr::geography("SRIDé;POINT(1 2)").unwrap_err();
        assert!(matches!(err, FilterError::InvalidQuery { .. }));
    }

    #[test]
    fn test_member_path_split() {
        assert_eq!(
            Expr::member("Datastream/Thing/name"),
            Expr::Member(vec![
                "Datastream".to_string(),
                "Thing".to_string(),
                "name".to_string()
            ])
        );
    }

    #[test]
    fn test_display_fragment() {
        let expr = Expr::binary(
            BinaryOp::And,
            Expr::call("startswith", vec![Expr::member("name"), Expr::string("it's")]),
            Expr::binary(BinaryOp::Ge, Expr::member("result"), Expr::int(6)),
        );
        assert_eq!(
            expr.to_string(),
            "(startswith(name,'it''s') and (result ge 6))"
        );
    }
}
