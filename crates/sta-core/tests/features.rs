//! FeatureOfInterest derivation and deduplication.

mod common;

use common::Harness;
use serde_json::json;
use sta_common::ErrorKind;
use sta_core::CoreConfig;
use sta_model::{Dataset, EntityKind, FeatureOfInterest, Location, Observation};
use test_utils::{
    assert_err_kind, datastream, feature_of_interest, location, observation, reference, thing,
    with,
};

const AT: &str = "2023-01-01T00:00:00Z";

#[test]
fn test_feature_derived_from_location() {
    let mut h = Harness::new();
    let seeded = h.seed();
    let ids = h.observe(vec![observation(seeded.datastream.as_str(), AT, json!(20.0))]);

    let obs = h.get::<Observation>(&ids[0]);
    assert_eq!(obs.feature_id, seeded.location);

    let feature = h.get::<FeatureOfInterest>(&obs.feature_id);
    let location = h.get::<Location>(&seeded.location);
    assert!(feature.auto_generated);
    assert_eq!(feature.feature, location.location);
    assert_eq!(feature.description, location.description);
    assert_eq!(feature.feature_type, location.encoding_type);
}

#[test]
fn test_derived_feature_reused() {
    let mut h = Harness::new();
    let seeded = h.seed();
    let ds = seeded.datastream.as_str();
    let ids = h.observe(vec![
        observation(ds, AT, json!(20.0)),
        observation(ds, "2023-01-01T01:00:00Z", json!(21.0)),
    ]);

    assert_eq!(h.count::<FeatureOfInterest>(), 1);
    assert_eq!(h.count::<Dataset>(), 1);
    assert_eq!(
        h.get::<Observation>(&ids[0]).dataset_id,
        h.get::<Observation>(&ids[1]).dataset_id
    );
}

#[test]
fn test_new_feature_after_thing_moves() {
    let mut h = Harness::new();
    let seeded = h.seed();
    let ds = seeded.datastream.as_str();
    h.observe(vec![observation(ds, AT, json!(20.0))]);

    let office = h
        .create(EntityKind::Location, location("office", 8.0, 50.0))
        .unwrap();
    h.merge(
        EntityKind::Thing,
        &seeded.thing,
        json!({ "Locations": [reference(office.as_str())] }),
    )
    .unwrap();
    let ids = h.observe(vec![observation(ds, "2023-01-01T02:00:00Z", json!(19.0))]);

    assert_eq!(h.get::<Observation>(&ids[0]).feature_id, office);
    assert_eq!(h.count::<FeatureOfInterest>(), 2);
    assert_eq!(h.count::<Dataset>(), 2);
}

#[test]
fn test_feature_shared_across_things() {
    let mut h = Harness::new();
    let seeded = h.seed();
    h.observe(vec![observation(seeded.datastream.as_str(), AT, json!(20.0))]);

    // A second station at the same spot, described the same way.
    let twin = with(location("home-2", 7.0, 51.0), "description", json!("home description"));
    let station = h
        .create(
            EntityKind::Thing,
            with(thing("second station"), "Locations", json!([twin])),
        )
        .unwrap();
    let ds = h
        .create(
            EntityKind::Datastream,
            datastream(
                "second temperature",
                reference(station.as_str()),
                reference(seeded.sensor.as_str()),
                reference(seeded.observed_property.as_str()),
            ),
        )
        .unwrap();
    let ids = h.observe(vec![observation(ds.as_str(), AT, json!(18.0))]);

    assert_eq!(h.count::<Location>(), 2);
    assert_eq!(h.count::<FeatureOfInterest>(), 1);
    assert_eq!(h.get::<Observation>(&ids[0]).feature_id, seeded.location);
}

#[test]
fn test_feature_reused_by_geometry_and_description() {
    let mut h = Harness::new();
    let first = h
        .create(EntityKind::FeatureOfInterest, feature_of_interest("lake", 9.0, 47.0))
        .unwrap();
    let renamed = with(feature_of_interest("lake", 9.0, 47.0), "name", json!("Lake"));
    let second = h.create(EntityKind::FeatureOfInterest, renamed).unwrap();
    assert_eq!(first, second);

    h.create(EntityKind::FeatureOfInterest, feature_of_interest("lake", 9.5, 47.0))
        .unwrap();
    assert_eq!(h.count::<FeatureOfInterest>(), 2);
}

#[test]
fn test_explicit_feature_id_conflicts() {
    let mut h = Harness::new();
    let body = with(feature_of_interest("lake", 9.0, 47.0), "@iot.id", json!("f1"));
    h.create(EntityKind::FeatureOfInterest, body.clone())
        .unwrap();
    assert_err_kind!(
        h.create(EntityKind::FeatureOfInterest, body),
        ErrorKind::Conflict
    );
}

#[test]
fn test_explicit_id_repeats_generated_feature() {
    let mut h = Harness::new();
    let seeded = h.seed();
    h.observe(vec![observation(seeded.datastream.as_str(), AT, json!(20.0))]);

    let same = with(
        with(feature_of_interest("home", 7.0, 51.0), "@iot.id", json!(seeded.location.as_str())),
        "description",
        json!("home description"),
    );
    let id = h.create(EntityKind::FeatureOfInterest, same).unwrap();
    assert_eq!(id, seeded.location);
    assert_eq!(h.count::<FeatureOfInterest>(), 1);

    let moved = with(
        feature_of_interest("home", 7.5, 51.0),
        "@iot.id",
        json!(seeded.location.as_str()),
    );
    assert_err_kind!(
        h.create(EntityKind::FeatureOfInterest, moved),
        ErrorKind::Conflict
    );
}

#[test]
fn test_thing_without_location_needs_explicit_feature() {
    let mut h = Harness::new();
    let seeded = h.seed();
    let nomad = h.create(EntityKind::Thing, thing("nomad")).unwrap();
    let ds = h
        .create(
            EntityKind::Datastream,
            datastream(
                "roaming",
                reference(nomad.as_str()),
                reference(seeded.sensor.as_str()),
                reference(seeded.observed_property.as_str()),
            ),
        )
        .unwrap();

    assert_err_kind!(
        h.create(EntityKind::Observation, observation(ds.as_str(), AT, json!(1.0))),
        ErrorKind::InvalidRequest
    );
    assert_eq!(h.count::<Observation>(), 0);

    let body = with(
        observation(ds.as_str(), AT, json!(1.0)),
        "FeatureOfInterest",
        feature_of_interest("trail", 10.0, 46.0),
    );
    let id = h.create(EntityKind::Observation, body).unwrap();
    let feature = h.get::<Observation>(&id).feature_id.clone();
    assert!(!h.get::<FeatureOfInterest>(&feature).auto_generated);
}

#[test]
fn test_derivation_can_be_disabled() {
    let mut h = Harness::with_config(CoreConfig {
        derive_feature_of_interest: false,
        ..CoreConfig::default()
    });
    let seeded = h.seed();

    assert_err_kind!(
        h.create(
            EntityKind::Observation,
            observation(seeded.datastream.as_str(), AT, json!(20.0)),
        ),
        ErrorKind::InvalidRequest
    );
    assert_eq!(h.count::<FeatureOfInterest>(), 0);

    let f = h
        .create(EntityKind::FeatureOfInterest, feature_of_interest("garden", 7.0, 51.0))
        .unwrap();
    let body = with(
        observation(seeded.datastream.as_str(), AT, json!(20.0)),
        "FeatureOfInterest",
        reference(f.as_str()),
    );
    let id = h.create(EntityKind::Observation, body).unwrap();
    assert_eq!(h.get::<Observation>(&id).feature_id, f);
}
