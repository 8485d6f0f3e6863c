//! In-memory execution of predicates against entity rows.
//!
//! Results follow SQL three-valued logic: `None` means unknown, and a row is
//! selected only when its predicate is `Some(true)`.

use crate::predicate::{ArithOp, CmpOp, ColumnRef, Hop, Predicate, ScalarExpr};
use crate::scalar::Scalar;
use std::cmp::Ordering;

/// A single stored entity whose columns can be read by name.
pub trait Row {
    /// Value of a storage column; unknown columns read as `Null`.
    fn field(&self, column: &str) -> Scalar;

    /// Identifier of the entity reached through a to-one relation.
    fn related_id(&self, relation: &str) -> Option<sta_common::EntityId>;
}

/// Supplies the row at the end of a navigation path.
pub trait ColumnSource {
    fn row_for(&self, hops: &[Hop]) -> Option<&dyn Row>;
}

/// A row evaluated on its own, without relation navigation.
pub struct Standalone<'a>(pub &'a dyn Row);

impl ColumnSource for Standalone<'_> {
    fn row_for(&self, hops: &[Hop]) -> Option<&dyn Row> {
        if hops.is_empty() {
            Some(self.0)
        } else {
            None
        }
    }
}

/// Read a column, following hops and any JSON path.
pub fn column_value(column: &ColumnRef, source: &dyn ColumnSource) -> Scalar {
    let Some(row) = source.row_for(&column.hops) else {
        return Scalar::Null;
    };
    let value = row.field(column.column);
    if column.json_path.is_empty() {
        return value;
    }
    match value {
        Scalar::Json(json) => Scalar::json_path(&json, &column.json_path),
        _ => Scalar::Null,
    }
}

/// Evaluate a scalar expression.
pub fn value(expr: &ScalarExpr, source: &dyn ColumnSource) -> Scalar {
    match expr {
        ScalarExpr::Literal(v) => v.clone(),
        ScalarExpr::Column(column) => column_value(column, source),
        ScalarExpr::Arith { op, left, right } => {
            arithmetic(*op, &value(left, source), &value(right, source))
        }
        ScalarExpr::Negate(inner) => match value(inner, source) {
            Scalar::Int(i) => i.checked_neg().map(Scalar::Int).unwrap_or(Scalar::Null),
            Scalar::Float(f) => Scalar::Float(-f),
            _ => Scalar::Null,
        },
        ScalarExpr::Call { func, args } => {
            let args: Vec<Scalar> = args.iter().map(|a| value(a, source)).collect();
            func.apply(&args)
        }
    }
}

fn arithmetic(op: ArithOp, left: &Scalar, right: &Scalar) -> Scalar {
    match (left, right) {
        (Scalar::Int(a), Scalar::Int(b)) => {
            let result = match op {
                ArithOp::Add => a.checked_add(*b),
                ArithOp::Sub => a.checked_sub(*b),
                ArithOp::Mul => a.checked_mul(*b),
                ArithOp::Div => a.checked_div(*b),
                ArithOp::Mod => a.checked_rem(*b),
            };
            result.map(Scalar::Int).unwrap_or(Scalar::Null)
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => {
                let result = match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div if b == 0.0 => return Scalar::Null,
                    ArithOp::Div => a / b,
                    ArithOp::Mod if b == 0.0 => return Scalar::Null,
                    ArithOp::Mod => a % b,
                };
                Scalar::Float(result)
            }
            _ => Scalar::Null,
        },
    }
}

fn compare(op: CmpOp, left: &Scalar, right: &Scalar) -> Option<bool> {
    let ordering = left.compare(right)?;
    Some(match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    })
}

/// Evaluate a predicate with three-valued logic.
pub fn evaluate(predicate: &Predicate, source: &dyn ColumnSource) -> Option<bool> {
    match predicate {
        Predicate::Const(b) => Some(*b),
        Predicate::Compare { op, left, right } => {
            compare(*op, &value(left, source), &value(right, source))
        }
        Predicate::And(parts) => {
            let mut unknown = false;
            for part in parts {
                match evaluate(part, source) {
                    Some(false) => return Some(false),
                    None => unknown = true,
                    Some(true) => {}
                }
            }
            if unknown {
                None
            } else {
                Some(true)
            }
        }
        Predicate::Or(parts) => {
            let mut unknown = false;
            for part in parts {
                match evaluate(part, source) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown {
                None
            } else {
                Some(false)
            }
        }
        Predicate::Not(inner) => evaluate(inner, source).map(|b| !b),
        Predicate::Truthy(expr) => match value(expr, source) {
            Scalar::Bool(b) => Some(b),
            _ => None,
        },
    }
}

/// True if the predicate selects the row.
pub fn matches(predicate: &Predicate, source: &dyn ColumnSource) -> bool {
    evaluate(predicate, source) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::builder::*;
    use sta_common::EntityId;
    use std::collections::HashMap;

    struct MapRow(HashMap<&'static str, Scalar>);

    impl Row for MapRow {
        fn field(&self, column: &str) -> Scalar {
            self.0.get(column).cloned().unwrap_or(Scalar::Null)
        }

        fn related_id(&self, _relation: &str) -> Option<EntityId> {
            None
        }
    }

    fn row(pairs: &[(&'static str, Scalar)]) -> MapRow {
        MapRow(pairs.iter().cloned().collect())
    }

    #[test]
    fn test_comparison() {
        let r = row(&[("result", Scalar::Int(6))]);
        let src = Standalone(&r);
        assert!(matches(&ge(column("result"), literal(6i64)), &src));
        assert!(!matches(&gt(column("result"), literal(6.5)), &src));
    }

    #[test]
    fn test_null_is_unknown() {
        let r = row(&[]);
        let src = Standalone(&r);
        let p = eq(column("name"), literal("x"));
        assert_eq!(evaluate(&p, &src), None);
        assert_eq!(evaluate(&not(p.clone()), &src), None);
        assert_eq!(evaluate(&or(p.clone(), Predicate::Const(true)), &src), Some(true));
        assert_eq!(
            evaluate(&Predicate::And(vec![p, Predicate::Const(false)]), &src),
            Some(false)
        );
    }

    #[test]
    fn test_arithmetic() {
        let r = row(&[("a", Scalar::Int(7)), ("b", Scalar::Int(0))]);
        let src = Standalone(&r);
        assert_eq!(
            value(&arith(ArithOp::Mod, column("a"), literal(4i64)), &src),
            Scalar::Int(3)
        );
        assert_eq!(
            value(&arith(ArithOp::Div, column("a"), column("b")), &src),
            Scalar::Null
        );
        assert_eq!(
            value(&arith(ArithOp::Add, column("a"), literal(0.5)), &src),
            Scalar::Float(7.5)
        );
    }

    #[test]
    fn test_json_path_column() {
        let r = row(&[(
            "properties",
            Scalar::Json(serde_json::json!({"owner": "Ada"})),
        )]);
        let src = Standalone(&r);
        let column = ColumnRef {
            hops: Vec::new(),
            column: "properties",
            json_path: vec!["owner".to_string()],
        };
        assert_eq!(column_value(&column, &src), Scalar::String("Ada".to_string()));
    }

    #[test]
    fn test_navigation_without_source_is_null() {
        let r = row(&[("name", Scalar::from("x"))]);
        let src = Standalone(&r);
        let column = ColumnRef {
            hops: vec![Hop {
                relation: "Thing",
                target: "Thing",
            }],
            column: "name",
            json_path: Vec::new(),
        };
        assert_eq!(column_value(&column, &src), Scalar::Null);
    }
}
