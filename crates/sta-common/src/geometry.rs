//! GeoJSON geometries for Locations and FeaturesOfInterest.
//!
//! Geometries are stored in their GeoJSON shape and converted to `geo-types`
//! only when a spatial function needs to evaluate them. Filter literals arrive
//! as WKT and are parsed with [`Geometry::from_wkt`].

use geo_types::{
    Coord, Geometry as GeoGeometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing geometries.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryParseError {
    /// Invalid WKT format.
    #[error("Invalid WKT format: {0}")]
    InvalidWkt(String),

    /// Invalid coordinate value.
    #[error("Invalid coordinate value: {0}")]
    InvalidCoordinate(String),

    /// Geometry type not supported.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    /// Array of linear rings (first is exterior, rest are holes).
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// Create a line string geometry.
    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates }
    }

    /// Create a polygon geometry.
    pub fn polygon(coordinates: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates }
    }

    /// GeoJSON type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// Convert to a `geo-types` geometry for spatial algorithms.
    pub fn to_geo(&self) -> GeoGeometry<f64> {
        match self {
            Geometry::Point { coordinates } => GeoGeometry::Point(to_point(coordinates)),
            Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(MultiPoint::new(
                coordinates.iter().map(to_point).collect(),
            )),
            Geometry::LineString { coordinates } => {
                GeoGeometry::LineString(to_line_string(coordinates))
            }
            Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
                MultiLineString::new(coordinates.iter().map(|l| to_line_string(l)).collect()),
            ),
            Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
            Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(
                MultiPolygon::new(coordinates.iter().map(|p| to_polygon(p)).collect()),
            ),
        }
    }

    /// Parse a WKT string.
    ///
    /// Accepts POINT, MULTIPOINT, LINESTRING, MULTILINESTRING, POLYGON and
    /// MULTIPOLYGON, optionally prefixed with an EWKT `SRID=n;` marker.
    pub fn from_wkt(wkt: &str) -> Result<Self, GeometryParseError> {
        let mut wkt = wkt.trim();
        if wkt.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("SRID=")) {
            let (_, rest) = wkt
                .split_once(';')
                .ok_or_else(|| GeometryParseError::InvalidWkt(wkt.to_string()))?;
            wkt = rest.trim();
        }

        let open = wkt
            .find('(')
            .ok_or_else(|| GeometryParseError::InvalidWkt("Missing opening parenthesis".to_string()))?;
        let type_name = wkt[..open].trim().to_uppercase();
        let body = parse_nested(&wkt[open..])?;

        match type_name.as_str() {
            "POINT" => {
                let coords = body.coords()?;
                if coords.len() != 1 {
                    return Err(GeometryParseError::InvalidWkt(format!(
                        "POINT expects one coordinate, got {}",
                        coords.len()
                    )));
                }
                Ok(Geometry::Point {
                    coordinates: coords[0],
                })
            }
            "LINESTRING" => Ok(Geometry::LineString {
                coordinates: body.coords()?,
            }),
            "POLYGON" => Ok(Geometry::Polygon {
                coordinates: body.rings()?,
            }),
            "MULTIPOINT" => {
                // Both MULTIPOINT(1 2, 3 4) and MULTIPOINT((1 2), (3 4)) are valid.
                let coordinates = match body.coords() {
                    Ok(coords) => coords,
                    Err(_) => body.rings()?.into_iter().flatten().collect(),
                };
                Ok(Geometry::MultiPoint { coordinates })
            }
            "MULTILINESTRING" => Ok(Geometry::MultiLineString {
                coordinates: body.rings()?,
            }),
            "MULTIPOLYGON" => Ok(Geometry::MultiPolygon {
                coordinates: body
                    .children()?
                    .iter()
                    .map(|p| p.rings())
                    .collect::<Result<_, _>>()?,
            }),
            other => Err(GeometryParseError::UnsupportedType(other.to_string())),
        }
    }
}

fn to_point(c: &[f64; 2]) -> Point<f64> {
    Point::new(c[0], c[1])
}

fn to_line_string(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(coords.iter().map(|c| Coord { x: c[0], y: c[1] }).collect())
}

fn to_polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    let mut rings = rings.iter();
    let exterior = rings
        .next()
        .map(|r| to_line_string(r))
        .unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.map(|r| to_line_string(r)).collect())
}

/// Parenthesised WKT body.
#[derive(Debug)]
enum Nested {
    Coord([f64; 2]),
    List(Vec<Nested>),
}

impl Nested {
    fn children(&self) -> Result<&[Nested], GeometryParseError> {
        match self {
            Nested::List(items) => Ok(items),
            Nested::Coord(_) => Err(GeometryParseError::InvalidWkt(
                "Expected parenthesised list".to_string(),
            )),
        }
    }

    fn coords(&self) -> Result<Vec<[f64; 2]>, GeometryParseError> {
        self.children()?
            .iter()
            .map(|item| match item {
                Nested::Coord(c) => Ok(*c),
                Nested::List(_) => Err(GeometryParseError::InvalidWkt(
                    "Expected coordinate, found nested list".to_string(),
                )),
            })
            .collect()
    }

    fn rings(&self) -> Result<Vec<Vec<[f64; 2]>>, GeometryParseError> {
        self.children()?.iter().map(|r| r.coords()).collect()
    }
}

fn parse_nested(input: &str) -> Result<Nested, GeometryParseError> {
    let mut stack: Vec<Vec<Nested>> = Vec::new();
    let mut current = String::new();
    let mut result = None;

    for ch in input.chars() {
        match ch {
            '(' => {
                if result.is_some() {
                    return Err(GeometryParseError::InvalidWkt(
                        "Trailing content after geometry".to_string(),
                    ));
                }
                stack.push(Vec::new());
            }
            ',' | ')' => {
                let top = stack.last_mut().ok_or_else(|| {
                    GeometryParseError::InvalidWkt("Unbalanced parentheses".to_string())
                })?;
                if !current.trim().is_empty() {
                    top.push(Nested::Coord(parse_coord(current.trim())?));
                }
                current.clear();

                if ch == ')' {
                    let items = stack.pop().unwrap_or_default();
                    let list = Nested::List(items);
                    match stack.last_mut() {
                        Some(parent) => parent.push(list),
                        None => result = Some(list),
                    }
                }
            }
            _ => {
                if stack.is_empty() && !ch.is_whitespace() {
                    return Err(GeometryParseError::InvalidWkt(format!(
                        "Unexpected character '{}'",
                        ch
                    )));
                }
                current.push(ch);
            }
        }
    }

    if !stack.is_empty() {
        return Err(GeometryParseError::InvalidWkt(
            "Missing closing parenthesis".to_string(),
        ));
    }

    result.ok_or_else(|| GeometryParseError::InvalidWkt("Empty geometry".to_string()))
}

fn parse_coord(s: &str) -> Result<[f64; 2], GeometryParseError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    // A third ordinate (Z) is accepted and dropped.
    if parts.len() < 2 || parts.len() > 3 {
        return Err(GeometryParseError::InvalidWkt(format!(
            "Expected 'x y' coordinate, got '{}'",
            s
        )));
    }

    let x: f64 = parts[0]
        .parse()
        .map_err(|_| GeometryParseError::InvalidCoordinate(parts[0].to_string()))?;
    let y: f64 = parts[1]
        .parse()
        .map_err(|_| GeometryParseError::InvalidCoordinate(parts[1].to_string()))?;

    Ok([x, y])
}

/// A GeoJSON input value that may be a bare geometry or a Feature wrapping one.
///
/// SensorThings clients send Location and FeatureOfInterest payloads in both shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum GeoJson {
    Geometry(Geometry),
    Feature { geometry: Geometry },
}

impl GeoJson {
    pub fn into_geometry(self) -> Geometry {
        match self {
            GeoJson::Geometry(g) | GeoJson::Feature { geometry: g } => g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wkt_point() {
        let g = Geometry::from_wkt("POINT(-117.05 51.05)").unwrap();
        assert_eq!(g, Geometry::point(-117.05, 51.05));

        let g = Geometry::from_wkt("point ( 1 2 )").unwrap();
        assert_eq!(g, Geometry::point(1.0, 2.0));
    }

    #[test]
    fn test_parse_wkt_with_srid() {
        let g = Geometry::from_wkt("SRID=4326;POINT(30 10)").unwrap();
        assert_eq!(g, Geometry::point(30.0, 10.0));
    }

    #[test]
    fn test_parse_wkt_polygon() {
        let g = Geometry::from_wkt("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        match g {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 5);
                assert_eq!(coordinates[0][2], [10.0, 10.0]);
            }
            other => panic!("Expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wkt_multipoint_forms() {
        let a = Geometry::from_wkt("MULTIPOINT((1 2),(3 4))").unwrap();
        let b = Geometry::from_wkt("MULTIPOINT(1 2, 3 4)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_wkt_multipolygon() {
        let g = Geometry::from_wkt(
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))",
        )
        .unwrap();
        match g {
            Geometry::MultiPolygon { coordinates } => assert_eq!(coordinates.len(), 2),
            other => panic!("Expected multipolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wkt_errors() {
        assert!(matches!(
            Geometry::from_wkt("POINT 1 2"),
            Err(GeometryParseError::InvalidWkt(_))
        ));
        assert!(matches!(
            Geometry::from_wkt("POINT(a b)"),
            Err(GeometryParseError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            Geometry::from_wkt("CIRCLE(1 2)"),
            Err(GeometryParseError::UnsupportedType(_))
        ));
        assert!(Geometry::from_wkt("POINT(1 2").is_err());
        assert!(Geometry::from_wkt("SRIDé;POINT(1 2)").is_err());
        assert!(Geometry::from_wkt("é").is_err());
    }

    #[test]
    fn test_geojson_feature_and_bare_geometry() {
        let bare: GeoJson =
            serde_json::from_str(r#"{"type":"Point","coordinates":[-114.06,51.05]}"#).unwrap();
        let feature: GeoJson = serde_json::from_str(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[-114.06,51.05]}}"#,
        )
        .unwrap();
        assert_eq!(bare.into_geometry(), feature.into_geometry());
    }

    #[test]
    fn test_to_geo_point() {
        match Geometry::point(1.0, 2.0).to_geo() {
            GeoGeometry::Point(p) => {
                assert_eq!(p.x(), 1.0);
                assert_eq!(p.y(), 2.0);
            }
            other => panic!("Expected point, got {:?}", other),
        }
    }
}
