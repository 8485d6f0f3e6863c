//! Backend-neutral predicate nodes and the builder functions that compose them.
//!
//! Both the filter evaluator and the entity services' dedup lookups build
//! predicates through [`builder`], so there is exactly one predicate shape for
//! storage to execute.

use crate::functions::Func;
use crate::scalar::Scalar;

/// One navigation step across a to-one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Relation name on the source entity (e.g. `Datastream`).
    pub relation: &'static str,
    /// Entity name the relation points to.
    pub target: &'static str,
}

/// A resolved reference to a storage column, possibly on a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub hops: Vec<Hop>,
    pub column: &'static str,
    /// Key path into a JSON column.
    pub json_path: Vec<String>,
}

impl ColumnRef {
    /// A column on the queried entity itself.
    pub fn local(column: &'static str) -> Self {
        Self {
            hops: Vec::new(),
            column,
            json_path: Vec::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.hops.is_empty() && self.json_path.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// The operator that gives the same result with operands swapped.
    pub fn flip(self) -> CmpOp {
        match self {
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A scalar-valued expression inside a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Literal(Scalar),
    Column(ColumnRef),
    Arith {
        op: ArithOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    Negate(Box<ScalarExpr>),
    Call {
        func: Func,
        args: Vec<ScalarExpr>,
    },
}

/// A boolean predicate with SQL three-valued semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Const(bool),
    Compare {
        op: CmpOp,
        left: ScalarExpr,
        right: ScalarExpr,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// A boolean-valued scalar used directly as a condition.
    Truthy(ScalarExpr),
}

/// Composable predicate-builder functions.
pub mod builder {
    use super::*;

    pub fn column(name: &'static str) -> ScalarExpr {
        ScalarExpr::Column(ColumnRef::local(name))
    }

    pub fn literal(value: impl Into<Scalar>) -> ScalarExpr {
        ScalarExpr::Literal(value.into())
    }

    pub fn compare(op: CmpOp, left: ScalarExpr, right: ScalarExpr) -> Predicate {
        Predicate::Compare { op, left, right }
    }

    pub fn eq(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Eq, left, right)
    }

    pub fn ne(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Ne, left, right)
    }

    pub fn lt(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Lt, left, right)
    }

    pub fn le(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Le, left, right)
    }

    pub fn gt(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Gt, left, right)
    }

    pub fn ge(left: ScalarExpr, right: ScalarExpr) -> Predicate {
        compare(CmpOp::Ge, left, right)
    }

    /// Conjunction, flattening nested `And` nodes and dropping `true`.
    pub fn and(left: Predicate, right: Predicate) -> Predicate {
        all_of(vec![left, right])
    }

    /// Disjunction, flattening nested `Or` nodes and dropping `false`.
    pub fn or(left: Predicate, right: Predicate) -> Predicate {
        any_of(vec![left, right])
    }

    pub fn not(inner: Predicate) -> Predicate {
        match inner {
            Predicate::Const(b) => Predicate::Const(!b),
            Predicate::Not(p) => *p,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
        let mut parts = Vec::new();
        for p in predicates {
            match p {
                Predicate::Const(true) => {}
                Predicate::Const(false) => return Predicate::Const(false),
                Predicate::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Const(true),
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
        let mut parts = Vec::new();
        for p in predicates {
            match p {
                Predicate::Const(false) => {}
                Predicate::Const(true) => return Predicate::Const(true),
                Predicate::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Const(false),
            1 => parts.remove(0),
            _ => Predicate::Or(parts),
        }
    }

    pub fn arith(op: ArithOp, left: ScalarExpr, right: ScalarExpr) -> ScalarExpr {
        ScalarExpr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(func: Func, args: Vec<ScalarExpr>) -> ScalarExpr {
        ScalarExpr::Call { func, args }
    }

    pub fn truthy(expr: ScalarExpr) -> Predicate {
        Predicate::Truthy(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    #[test]
    fn test_and_flattens() {
        let p = and(
            and(eq(column("a"), literal(1i64)), eq(column("b"), literal(2i64))),
            Predicate::Const(true),
        );
        match p {
            Predicate::And(parts) => assert_eq!(parts.len(), 2),
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_short_circuit_constants() {
        assert_eq!(
            and(Predicate::Const(false), eq(column("a"), literal(1i64))),
            Predicate::Const(false)
        );
        assert_eq!(
            or(Predicate::Const(true), eq(column("a"), literal(1i64))),
            Predicate::Const(true)
        );
        assert_eq!(not(not(Predicate::Const(true))), Predicate::Const(true));
    }

    #[test]
    fn test_flip() {
        assert_eq!(CmpOp::Lt.flip(), CmpOp::Gt);
        assert_eq!(CmpOp::Ge.flip(), CmpOp::Le);
        assert_eq!(CmpOp::Eq.flip(), CmpOp::Eq);
    }
}
