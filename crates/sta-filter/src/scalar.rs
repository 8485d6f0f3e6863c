//! Runtime scalar values produced while evaluating predicates.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use sta_common::Geometry;
use std::cmp::Ordering;

use crate::expr::Literal;

/// A typed value read from an entity column or produced by an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    TimeOfDay(NaiveTime),
    Geometry(Geometry),
    /// Free-form JSON such as a `properties` map.
    Json(Value),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Convert a JSON value into the closest scalar.
    ///
    /// Objects and arrays stay as [`Scalar::Json`].
    pub fn from_json(value: &Value) -> Scalar {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::String(s.clone()),
            other => Scalar::Json(other.clone()),
        }
    }

    /// Follow a key path into a JSON value. Missing keys yield `Null`.
    pub fn json_path(value: &Value, path: &[String]) -> Scalar {
        let mut current = value;
        for segment in path {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return Scalar::Null,
            }
        }
        Scalar::from_json(current)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two scalars of comparable types.
    ///
    /// Integers and floats compare numerically; everything else must match
    /// exactly. Incomparable pairs (including any `Null`) return `None`.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Null, _) | (_, Scalar::Null) => None,
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Int(_) | Scalar::Float(_), Scalar::Int(_) | Scalar::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::DateTime(a), Scalar::DateTime(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::TimeOfDay(a), Scalar::TimeOfDay(b)) => Some(a.cmp(b)),
            (Scalar::Geometry(a), Scalar::Geometry(b)) => {
                if a == b {
                    Some(Ordering::Equal)
                } else {
                    None
                }
            }
            (Scalar::Json(a), Scalar::Json(b)) => {
                if a == b {
                    Some(Ordering::Equal)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Position of each variant when `$orderby` meets mixed types.
    fn sort_rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::String(_) => 3,
            Scalar::DateTime(_) => 4,
            Scalar::Date(_) => 5,
            Scalar::TimeOfDay(_) => 6,
            Scalar::Geometry(_) => 7,
            Scalar::Json(_) => 8,
        }
    }

    /// Total order for `$orderby`.
    ///
    /// Nulls sort first, then values grouped by type in [`Self::sort_rank`]
    /// order. Numbers compare by value with `f64::total_cmp`; a float sorts
    /// before an integer of the same value. Geometries and JSON documents
    /// compare by their serialized text.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => a.total_cmp(b),
            (Scalar::Int(a), Scalar::Float(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Greater)
            }
            (Scalar::Float(a), Scalar::Int(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Less),
            (Scalar::Geometry(a), Scalar::Geometry(b)) => {
                let text = |g: &Geometry| serde_json::to_string(g).unwrap_or_default();
                text(a).cmp(&text(b))
            }
            (Scalar::Json(a), Scalar::Json(b)) => a.to_string().cmp(&b.to_string()),
            _ => match self.compare(other) {
                Some(ordering) => ordering,
                None => self.sort_rank().cmp(&other.sort_rank()),
            },
        }
    }
}

impl From<&Literal> for Scalar {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Scalar::Null,
            Literal::Boolean(b) => Scalar::Bool(*b),
            Literal::Integer(i) => Scalar::Int(*i),
            Literal::Decimal(f) => Scalar::Float(*f),
            Literal::String(s) => Scalar::String(s.clone()),
            Literal::DateTime(dt) => Scalar::DateTime(*dt),
            Literal::Date(d) => Scalar::Date(*d),
            Literal::TimeOfDay(t) => Scalar::TimeOfDay(*t),
            Literal::Geometry(g) => Scalar::Geometry(g.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(dt: DateTime<Utc>) -> Self {
        Scalar::DateTime(dt)
    }
}

impl From<Geometry> for Scalar {
    fn from(g: Geometry) -> Self {
        Scalar::Geometry(g)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Scalar::Int(6).compare(&Scalar::Float(6.0)), Some(Ordering::Equal));
        assert_eq!(Scalar::Float(5.5).compare(&Scalar::Int(6)), Some(Ordering::Less));
    }

    #[test]
    fn test_mismatched_types_are_incomparable() {
        assert_eq!(Scalar::Int(1).compare(&Scalar::String("1".to_string())), None);
        assert_eq!(Scalar::Null.compare(&Scalar::Null), None);
    }

    #[test]
    fn test_json_path() {
        let v = json!({"owner": {"name": "Ada"}, "tags": ["a", "b"], "floor": 3});
        assert_eq!(
            Scalar::json_path(&v, &["owner".to_string(), "name".to_string()]),
            Scalar::String("Ada".to_string())
        );
        assert_eq!(
            Scalar::json_path(&v, &["tags".to_string(), "1".to_string()]),
            Scalar::String("b".to_string())
        );
        assert_eq!(Scalar::json_path(&v, &["floor".to_string()]), Scalar::Int(3));
        assert_eq!(Scalar::json_path(&v, &["missing".to_string()]), Scalar::Null);
    }

    #[test]
    fn test_sort_nulls_first() {
        let mut values = vec![Scalar::Int(3), Scalar::Null, Scalar::Int(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Scalar::Null, Scalar::Int(1), Scalar::Int(3)]);
    }

    #[test]
    fn test_sort_groups_mixed_types() {
        let mut values = vec![
            Scalar::String("b".to_string()),
            Scalar::Float(2.5),
            Scalar::Bool(true),
            Scalar::Int(2),
            Scalar::Null,
            Scalar::String("a".to_string()),
            Scalar::Float(2.0),
            Scalar::Float(f64::NAN),
            Scalar::Int(-1),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values[0], Scalar::Null);
        assert_eq!(values[1], Scalar::Bool(true));
        assert_eq!(values[2], Scalar::Int(-1));
        assert_eq!(values[3], Scalar::Float(2.0));
        assert_eq!(values[4], Scalar::Int(2));
        assert_eq!(values[5], Scalar::Float(2.5));
        assert!(matches!(values[6], Scalar::Float(f) if f.is_nan()));
        assert_eq!(values[7], Scalar::String("a".to_string()));
        assert_eq!(values[8], Scalar::String("b".to_string()));
    }

    #[test]
    fn test_sort_never_ties_different_types() {
        let values = [
            Scalar::Null,
            Scalar::Bool(false),
            Scalar::Float(0.0),
            Scalar::Int(0),
            Scalar::String(String::new()),
            Scalar::Json(json!({})),
        ];
        for (i, a) in values.iter().enumerate() {
            for (j, b) in values.iter().enumerate() {
                assert_eq!(a.sort_cmp(b), i.cmp(&j), "{:?} vs {:?}", a, b);
            }
        }
    }
}
