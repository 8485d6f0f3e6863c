//! Built-in filter functions.
//!
//! Lookup goes by arity first and then by name, so a known name called with
//! the wrong number of arguments is reported as unsupported.

use chrono::{Datelike, Timelike};

use crate::scalar::Scalar;
use crate::schema::ValueType;
use crate::spatial::{self, SpatialRelation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    // string, 1-arg
    Length,
    ToLower,
    ToUpper,
    Trim,
    // temporal
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    FractionalSeconds,
    Date,
    Time,
    // math
    Round,
    Floor,
    Ceiling,
    // string, 2/3-arg
    SubstringOf,
    IndexOf,
    Substring,
    Concat,
    StartsWith,
    EndsWith,
    // spatial
    StEquals,
    StDisjoint,
    StTouches,
    StWithin,
    StOverlaps,
    StCrosses,
    StIntersects,
    StContains,
    GeoDistance,
    GeoLength,
    GeoIntersects,
    StRelate,
}

impl Func {
    /// Resolve a method call. Names are matched case-insensitively.
    pub fn lookup(name: &str, arity: usize) -> Option<Func> {
        let name = name.to_ascii_lowercase();
        let func = match arity {
            1 => match name.as_str() {
                "length" => Func::Length,
                "tolower" => Func::ToLower,
                "toupper" => Func::ToUpper,
                "trim" => Func::Trim,
                "year" => Func::Year,
                "month" => Func::Month,
                "day" => Func::Day,
                "hour" => Func::Hour,
                "minute" => Func::Minute,
                "second" => Func::Second,
                "fractionalseconds" => Func::FractionalSeconds,
                "date" => Func::Date,
                "time" => Func::Time,
                "round" => Func::Round,
                "floor" => Func::Floor,
                "ceiling" => Func::Ceiling,
                "geo.length" => Func::GeoLength,
                _ => return None,
            },
            2 => match name.as_str() {
                "substringof" => Func::SubstringOf,
                "indexof" => Func::IndexOf,
                "substring" => Func::Substring,
                "concat" => Func::Concat,
                "startswith" => Func::StartsWith,
                "endswith" => Func::EndsWith,
                "st_equals" => Func::StEquals,
                "st_disjoint" => Func::StDisjoint,
                "st_touches" => Func::StTouches,
                "st_within" => Func::StWithin,
                "st_overlaps" => Func::StOverlaps,
                "st_crosses" => Func::StCrosses,
                "st_intersects" => Func::StIntersects,
                "st_contains" => Func::StContains,
                "geo.distance" => Func::GeoDistance,
                "geo.intersects" => Func::GeoIntersects,
                _ => return None,
            },
            3 => match name.as_str() {
                "substring" => Func::Substring,
                "st_relate" => Func::StRelate,
                _ => return None,
            },
            _ => return None,
        };
        Some(func)
    }

    pub fn result_type(&self) -> ValueType {
        match self {
            Func::ToLower | Func::ToUpper | Func::Trim | Func::Substring | Func::Concat => {
                ValueType::String
            }
            Func::Length
            | Func::Year
            | Func::Month
            | Func::Day
            | Func::Hour
            | Func::Minute
            | Func::Second
            | Func::FractionalSeconds
            | Func::Round
            | Func::Floor
            | Func::Ceiling
            | Func::IndexOf
            | Func::GeoDistance
            | Func::GeoLength => ValueType::Number,
            Func::Date => ValueType::Date,
            Func::Time => ValueType::TimeOfDay,
            Func::SubstringOf
            | Func::StartsWith
            | Func::EndsWith
            | Func::StEquals
            | Func::StDisjoint
            | Func::StTouches
            | Func::StWithin
            | Func::StOverlaps
            | Func::StCrosses
            | Func::StIntersects
            | Func::StContains
            | Func::GeoIntersects
            | Func::StRelate => ValueType::Boolean,
        }
    }

    /// Whether an argument of type `ty` is acceptable at position `index`.
    pub fn accepts(&self, index: usize, ty: ValueType) -> bool {
        if ty == ValueType::Any {
            return true;
        }
        match self {
            Func::Length
            | Func::ToLower
            | Func::ToUpper
            | Func::Trim
            | Func::SubstringOf
            | Func::Concat
            | Func::StartsWith
            | Func::EndsWith
            | Func::IndexOf => ty == ValueType::String,
            Func::Substring => {
                if index == 0 {
                    ty == ValueType::String
                } else {
                    ty == ValueType::Number
                }
            }
            Func::Year | Func::Month | Func::Day => {
                matches!(ty, ValueType::DateTime | ValueType::Date)
            }
            Func::Hour | Func::Minute | Func::Second | Func::FractionalSeconds => {
                matches!(ty, ValueType::DateTime | ValueType::TimeOfDay)
            }
            Func::Date | Func::Time => ty == ValueType::DateTime,
            Func::Round | Func::Floor | Func::Ceiling => ty == ValueType::Number,
            Func::StRelate if index == 2 => ty == ValueType::String,
            Func::StEquals
            | Func::StDisjoint
            | Func::StTouches
            | Func::StWithin
            | Func::StOverlaps
            | Func::StCrosses
            | Func::StIntersects
            | Func::StContains
            | Func::GeoDistance
            | Func::GeoLength
            | Func::GeoIntersects
            | Func::StRelate => ty == ValueType::Geometry,
        }
    }

    /// Apply the function to evaluated arguments.
    ///
    /// Any `Null` argument yields `Null`, as does an argument whose runtime
    /// type does not fit.
    pub fn apply(&self, args: &[Scalar]) -> Scalar {
        if args.iter().any(Scalar::is_null) {
            return Scalar::Null;
        }
        self.apply_non_null(args).unwrap_or(Scalar::Null)
    }

    fn apply_non_null(&self, args: &[Scalar]) -> Option<Scalar> {
        let text = |i: usize| args.get(i).and_then(Scalar::as_str);
        let geometry = |i: usize| match args.get(i) {
            Some(Scalar::Geometry(g)) => Some(g),
            _ => None,
        };
        let relation = |rel: SpatialRelation| -> Option<Scalar> {
            Some(Scalar::Bool(spatial::holds(rel, geometry(0)?, geometry(1)?)))
        };

        let value = match self {
            Func::Length => Scalar::Int(text(0)?.chars().count() as i64),
            Func::ToLower => Scalar::String(text(0)?.to_lowercase()),
            Func::ToUpper => Scalar::String(text(0)?.to_uppercase()),
            Func::Trim => Scalar::String(text(0)?.trim().to_string()),
            Func::Year | Func::Month | Func::Day => {
                let date = match &args[0] {
                    Scalar::DateTime(dt) => dt.date_naive(),
                    Scalar::Date(d) => *d,
                    _ => return None,
                };
                Scalar::Int(match self {
                    Func::Year => date.year() as i64,
                    Func::Month => date.month() as i64,
                    _ => date.day() as i64,
                })
            }
            Func::Hour | Func::Minute | Func::Second | Func::FractionalSeconds => {
                let time = match &args[0] {
                    Scalar::DateTime(dt) => dt.time(),
                    Scalar::TimeOfDay(t) => *t,
                    _ => return None,
                };
                match self {
                    Func::Hour => Scalar::Int(time.hour() as i64),
                    Func::Minute => Scalar::Int(time.minute() as i64),
                    Func::Second => Scalar::Int(time.second() as i64),
                    _ => Scalar::Float(time.nanosecond() as f64 / 1_000_000_000.0),
                }
            }
            Func::Date => match &args[0] {
                Scalar::DateTime(dt) => Scalar::Date(dt.date_naive()),
                _ => return None,
            },
            Func::Time => match &args[0] {
                Scalar::DateTime(dt) => Scalar::TimeOfDay(dt.time()),
                _ => return None,
            },
            Func::Round | Func::Floor | Func::Ceiling => match &args[0] {
                Scalar::Int(i) => Scalar::Int(*i),
                Scalar::Float(f) => Scalar::Float(match self {
                    Func::Round => f.round(),
                    Func::Floor => f.floor(),
                    _ => f.ceil(),
                }),
                _ => return None,
            },
            Func::SubstringOf => Scalar::Bool(text(1)?.contains(text(0)?)),
            Func::IndexOf => {
                let haystack = text(0)?;
                let index = haystack
                    .find(text(1)?)
                    .map(|byte| haystack[..byte].chars().count() as i64)
                    .unwrap_or(-1);
                Scalar::Int(index)
            }
            Func::Substring => {
                let start = args.get(1)?.as_f64()?.max(0.0) as usize;
                let chars = text(0)?.chars().skip(start);
                let out: String = match args.get(2) {
                    Some(len) => chars.take(len.as_f64()?.max(0.0) as usize).collect(),
                    None => chars.collect(),
                };
                Scalar::String(out)
            }
            Func::Concat => Scalar::String(format!("{}{}", text(0)?, text(1)?)),
            Func::StartsWith => Scalar::Bool(text(0)?.starts_with(text(1)?)),
            Func::EndsWith => Scalar::Bool(text(0)?.ends_with(text(1)?)),
            Func::StEquals => return relation(SpatialRelation::Equals),
            Func::StDisjoint => return relation(SpatialRelation::Disjoint),
            Func::StTouches => return relation(SpatialRelation::Touches),
            Func::StWithin => return relation(SpatialRelation::Within),
            Func::StOverlaps => return relation(SpatialRelation::Overlaps),
            Func::StCrosses => return relation(SpatialRelation::Crosses),
            Func::StIntersects | Func::GeoIntersects => {
                return relation(SpatialRelation::Intersects)
            }
            Func::StContains => return relation(SpatialRelation::Contains),
            Func::GeoDistance => Scalar::Float(spatial::distance(geometry(0)?, geometry(1)?)),
            Func::GeoLength => Scalar::Float(spatial::length(geometry(0)?)),
            Func::StRelate => Scalar::Bool(spatial::relate(geometry(0)?, geometry(1)?, text(2)?)),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sta_common::Geometry;

    fn s(v: &str) -> Scalar {
        Scalar::String(v.to_string())
    }

    #[test]
    fn test_lookup_by_arity() {
        assert_eq!(Func::lookup("startswith", 2), Some(Func::StartsWith));
        assert_eq!(Func::lookup("StartsWith", 2), Some(Func::StartsWith));
        assert_eq!(Func::lookup("startswith", 1), None);
        assert_eq!(Func::lookup("substring", 3), Some(Func::Substring));
        assert_eq!(Func::lookup("st_relate", 3), Some(Func::StRelate));
        assert_eq!(Func::lookup("st_relate", 2), None);
        assert_eq!(Func::lookup("frobnicate", 1), None);
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(Func::Length.apply(&[s("thing")]), Scalar::Int(5));
        assert_eq!(Func::ToUpper.apply(&[s("ab")]), s("AB"));
        assert_eq!(Func::Trim.apply(&[s("  x ")]), s("x"));
        assert_eq!(Func::IndexOf.apply(&[s("thing"), s("in")]), Scalar::Int(2));
        assert_eq!(Func::IndexOf.apply(&[s("thing"), s("zz")]), Scalar::Int(-1));
        assert_eq!(Func::Substring.apply(&[s("thing"), Scalar::Int(1)]), s("hing"));
        assert_eq!(
            Func::Substring.apply(&[s("thing"), Scalar::Int(1), Scalar::Int(2)]),
            s("hi")
        );
        assert_eq!(Func::SubstringOf.apply(&[s("in"), s("thing")]), Scalar::Bool(true));
        assert_eq!(Func::Concat.apply(&[s("a"), s("b")]), s("ab"));
    }

    #[test]
    fn test_null_propagation() {
        assert_eq!(Func::StartsWith.apply(&[Scalar::Null, s("a")]), Scalar::Null);
        assert_eq!(Func::Year.apply(&[s("not a date")]), Scalar::Null);
    }

    #[test]
    fn test_temporal_functions() {
        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let arg = [Scalar::DateTime(dt)];
        assert_eq!(Func::Year.apply(&arg), Scalar::Int(2021));
        assert_eq!(Func::Month.apply(&arg), Scalar::Int(3));
        assert_eq!(Func::Day.apply(&arg), Scalar::Int(4));
        assert_eq!(Func::Hour.apply(&arg), Scalar::Int(5));
        assert_eq!(Func::Minute.apply(&arg), Scalar::Int(6));
        assert_eq!(Func::Second.apply(&arg), Scalar::Int(7));
        assert_eq!(Func::FractionalSeconds.apply(&arg), Scalar::Float(0.0));
    }

    #[test]
    fn test_math_functions() {
        assert_eq!(Func::Round.apply(&[Scalar::Float(2.5)]), Scalar::Float(3.0));
        assert_eq!(Func::Floor.apply(&[Scalar::Float(-2.5)]), Scalar::Float(-3.0));
        assert_eq!(Func::Ceiling.apply(&[Scalar::Int(4)]), Scalar::Int(4));
    }

    #[test]
    fn test_spatial_functions() {
        let p = Scalar::Geometry(Geometry::point(1.0, 1.0));
        let area = Scalar::Geometry(Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ]]));
        assert_eq!(Func::StWithin.apply(&[p.clone(), area.clone()]), Scalar::Bool(true));
        assert_eq!(Func::GeoIntersects.apply(&[area.clone(), p.clone()]), Scalar::Bool(true));
        assert_eq!(
            Func::StRelate.apply(&[p, area, s("T*F**F***")]),
            Scalar::Bool(true)
        );
    }

    #[test]
    fn test_argument_types() {
        assert!(Func::StartsWith.accepts(0, ValueType::String));
        assert!(!Func::StartsWith.accepts(0, ValueType::Number));
        assert!(Func::Year.accepts(0, ValueType::Any));
        assert!(Func::Substring.accepts(1, ValueType::Number));
        assert!(Func::StRelate.accepts(2, ValueType::String));
        assert!(!Func::StRelate.accepts(1, ValueType::String));
    }
}
