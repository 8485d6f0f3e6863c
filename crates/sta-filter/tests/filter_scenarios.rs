//! End-to-end filter scenarios over simple in-memory rows.

use chrono::{TimeZone, Utc};
use sta_common::{EntityId, Geometry};
use sta_filter::eval::matches;
use sta_filter::{
    BinaryOp, Expr, FilterEvaluator, Property, PropertyMap, Row, Scalar, SchemaRegistry,
    Standalone, ValueType,
};
use std::collections::HashMap;

static THING: PropertyMap = PropertyMap {
    entity: "Thing",
    properties: &[
        ("id", Property::Column { name: "id", ty: ValueType::String }),
        ("name", Property::Column { name: "name", ty: ValueType::String }),
        ("properties", Property::Json { name: "properties" }),
    ],
};

static OBSERVATION: PropertyMap = PropertyMap {
    entity: "Observation",
    properties: &[
        ("id", Property::Column { name: "id", ty: ValueType::String }),
        ("result", Property::Column { name: "result", ty: ValueType::Any }),
        (
            "phenomenonTime",
            Property::Span {
                start: "samplingTimeStart",
                end: "samplingTimeEnd",
            },
        ),
    ],
};

static LOCATION: PropertyMap = PropertyMap {
    entity: "Location",
    properties: &[
        ("id", Property::Column { name: "id", ty: ValueType::String }),
        ("location", Property::Column { name: "location", ty: ValueType::Geometry }),
    ],
};

struct Registry;

impl SchemaRegistry for Registry {
    fn property_map(&self, entity: &str) -> Option<&'static PropertyMap> {
        match entity {
            "Thing" => Some(&THING),
            "Observation" => Some(&OBSERVATION),
            "Location" => Some(&LOCATION),
            _ => None,
        }
    }
}

struct MapRow(HashMap<&'static str, Scalar>);

impl Row for MapRow {
    fn field(&self, column: &str) -> Scalar {
        self.0.get(column).cloned().unwrap_or(Scalar::Null)
    }

    fn related_id(&self, _relation: &str) -> Option<EntityId> {
        None
    }
}

fn select<'r>(
    root: &'static PropertyMap,
    rows: &'r [MapRow],
    filter: &Expr,
) -> Vec<&'r MapRow> {
    let evaluator = FilterEvaluator::new(&Registry, root, Utc::now());
    let predicate = evaluator.predicate(filter).unwrap();
    rows.iter()
        .filter(|r| matches(&predicate, &Standalone(*r)))
        .collect()
}

fn observation(id: &str, result: i64, hour: u32) -> MapRow {
    let t = Utc.with_ymd_and_hms(2023, 6, 1, hour, 0, 0).unwrap();
    MapRow(HashMap::from([
        ("id", Scalar::from(id)),
        ("result", Scalar::Int(result)),
        ("samplingTimeStart", Scalar::DateTime(t)),
        ("samplingTimeEnd", Scalar::DateTime(t)),
    ]))
}

#[test]
fn test_result_ge_selects_single_observation() {
    let rows: Vec<MapRow> = [3, 4, 5, 6]
        .iter()
        .enumerate()
        .map(|(i, r)| observation(&format!("o{}", i), *r, i as u32))
        .collect();
    let filter = Expr::binary(BinaryOp::Ge, Expr::member("result"), Expr::int(6));
    let hits = select(&OBSERVATION, &rows, &filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].field("result"), Scalar::Int(6));
}

#[test]
fn test_startswith_on_thing_name() {
    let rows = vec![MapRow(HashMap::from([
        ("id", Scalar::from("t1")),
        ("name", Scalar::from("thing name 1")),
    ]))];
    let hit = Expr::call("startswith", vec![Expr::member("name"), Expr::string("thing")]);
    assert_eq!(select(&THING, &rows, &hit).len(), 1);

    let miss = Expr::call("startswith", vec![Expr::member("name"), Expr::string("i")]);
    assert!(select(&THING, &rows, &miss).is_empty());
}

#[test]
fn test_phenomenon_time_range() {
    let rows: Vec<MapRow> = (0..4).map(|h| observation(&format!("o{}", h), 1, h)).collect();
    let from = Utc.with_ymd_and_hms(2023, 6, 1, 1, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2023, 6, 1, 3, 0, 0).unwrap();
    let filter = Expr::binary(
        BinaryOp::And,
        Expr::binary(BinaryOp::Ge, Expr::member("phenomenonTime"), Expr::datetime(from)),
        Expr::binary(BinaryOp::Lt, Expr::member("phenomenonTime"), Expr::datetime(to)),
    );
    assert_eq!(select(&OBSERVATION, &rows, &filter).len(), 2);
}

#[test]
fn test_json_property_path() {
    let rows = vec![
        MapRow(HashMap::from([
            ("id", Scalar::from("t1")),
            ("properties", Scalar::Json(serde_json::json!({"floor": 3}))),
        ])),
        MapRow(HashMap::from([
            ("id", Scalar::from("t2")),
            ("properties", Scalar::Json(serde_json::json!({"floor": 1}))),
        ])),
        MapRow(HashMap::from([("id", Scalar::from("t3"))])),
    ];
    let filter = Expr::binary(BinaryOp::Gt, Expr::member("properties/floor"), Expr::int(2));
    let hits = select(&THING, &rows, &filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].field("id"), Scalar::from("t1"));
}

#[test]
fn test_spatial_filter() {
    let rows = vec![
        MapRow(HashMap::from([
            ("id", Scalar::from("inside")),
            ("location", Scalar::Geometry(Geometry::point(1.0, 1.0))),
        ])),
        MapRow(HashMap::from([
            ("id", Scalar::from("outside")),
            ("location", Scalar::Geometry(Geometry::point(9.0, 9.0))),
        ])),
    ];
    let area = Geometry::from_wkt("POLYGON((0 0, 4 0, 4 4, 0 4, 0 0))").unwrap();
    let filter = Expr::call(
        "st_within",
        vec![Expr::member("location"), Expr::geometry(area)],
    );
    let hits = select(&LOCATION, &rows, &filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].field("id"), Scalar::from("inside"));

    let near = Expr::binary(
        BinaryOp::Lt,
        Expr::call(
            "geo.distance",
            vec![Expr::member("location"), Expr::geometry(Geometry::point(0.0, 0.0))],
        ),
        Expr::decimal(2.0),
    );
    assert_eq!(select(&LOCATION, &rows, &near).len(), 1);
}

#[test]
fn test_not_and_or() {
    let rows: Vec<MapRow> = [3, 4, 5, 6]
        .iter()
        .enumerate()
        .map(|(i, r)| observation(&format!("o{}", i), *r, i as u32))
        .collect();
    let filter = Expr::not(Expr::binary(
        BinaryOp::Or,
        Expr::binary(BinaryOp::Eq, Expr::member("result"), Expr::int(3)),
        Expr::binary(BinaryOp::Eq, Expr::member("result"), Expr::int(6)),
    ));
    assert_eq!(select(&OBSERVATION, &rows, &filter).len(), 2);
}
