//! Spatial predicates and measures over GeoJSON geometries.
//!
//! Topological predicates are answered from the DE-9IM intersection matrix
//! computed by `geo::Relate`.

use geo::{Distance, Euclidean, Relate};
use sta_common::Geometry;

/// Topological relation between two geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    Equals,
    Disjoint,
    Touches,
    Within,
    Overlaps,
    Crosses,
    Intersects,
    Contains,
}

/// Topological dimension: 0 for points, 1 for lines, 2 for areas.
pub fn dimension(geometry: &Geometry) -> u8 {
    match geometry {
        Geometry::Point { .. } | Geometry::MultiPoint { .. } => 0,
        Geometry::LineString { .. } | Geometry::MultiLineString { .. } => 1,
        Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => 2,
    }
}

/// True if `pattern` is a well-formed DE-9IM pattern.
pub fn is_valid_pattern(pattern: &str) -> bool {
    pattern.len() == 9
        && pattern
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'T' | 'F' | '*' | '0' | '1' | '2'))
}

/// Test the DE-9IM matrix of `a` against `b` with a pattern.
pub fn relate(a: &Geometry, b: &Geometry, pattern: &str) -> bool {
    if !is_valid_pattern(pattern) {
        return false;
    }
    let matrix = a.to_geo().relate(&b.to_geo());
    matrix.matches(&pattern.to_ascii_uppercase()).unwrap_or(false)
}

fn any_pattern(a: &Geometry, b: &Geometry, patterns: &[&str]) -> bool {
    let matrix = a.to_geo().relate(&b.to_geo());
    patterns
        .iter()
        .any(|p| matrix.matches(p).unwrap_or(false))
}

/// Evaluate a named topological relation.
pub fn holds(relation: SpatialRelation, a: &Geometry, b: &Geometry) -> bool {
    match relation {
        SpatialRelation::Equals => any_pattern(a, b, &["T*F**FFF*"]),
        SpatialRelation::Disjoint => any_pattern(a, b, &["FF*FF****"]),
        SpatialRelation::Intersects => !any_pattern(a, b, &["FF*FF****"]),
        SpatialRelation::Touches => any_pattern(a, b, &["FT*******", "F**T*****", "F***T****"]),
        SpatialRelation::Within => any_pattern(a, b, &["T*F**F***"]),
        SpatialRelation::Contains => any_pattern(a, b, &["T*****FF*"]),
        SpatialRelation::Crosses => {
            let (da, db) = (dimension(a), dimension(b));
            if da < db {
                any_pattern(a, b, &["T*T******"])
            } else if da > db {
                any_pattern(a, b, &["T*****T**"])
            } else if da == 1 {
                any_pattern(a, b, &["0********"])
            } else {
                false
            }
        }
        SpatialRelation::Overlaps => {
            let (da, db) = (dimension(a), dimension(b));
            if da != db {
                false
            } else if da == 1 {
                any_pattern(a, b, &["1*T***T**"])
            } else {
                any_pattern(a, b, &["T*T***T**"])
            }
        }
    }
}

/// Planar distance in coordinate units.
pub fn distance(a: &Geometry, b: &Geometry) -> f64 {
    Euclidean.distance(&a.to_geo(), &b.to_geo())
}

/// Planar length of the linear parts of a geometry. Points have length zero;
/// polygons contribute their ring perimeters.
pub fn length(geometry: &Geometry) -> f64 {
    fn path(coords: &[[f64; 2]]) -> f64 {
        coords
            .windows(2)
            .map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]))
            .sum()
    }
    match geometry {
        Geometry::Point { .. } | Geometry::MultiPoint { .. } => 0.0,
        Geometry::LineString { coordinates } => path(coordinates),
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            coordinates.iter().map(|l| path(l)).sum()
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .flat_map(|p| p.iter())
            .map(|l| path(l))
            .sum(),
    }
}
