//! Scoping predicates for navigation paths such as `Things(1)/Datastreams`.

use sta_common::{EntityId, StaError, StaResult};
use sta_filter::builder::{any_of, column, eq, literal};
use sta_filter::{ColumnRef, Hop, Predicate, ScalarExpr};
use sta_model::{
    Datastream, EntityKind, FeatureOfInterest, HistoricalLocation, Location, Observation,
    ObservedProperty, Sensor, Thing,
};
use storage::Tables;

/// Rows whose to-one `relation` points at `id`.
fn related(relation: &'static str, id: &EntityId) -> Predicate {
    eq(
        ScalarExpr::Column(ColumnRef {
            hops: vec![Hop {
                relation,
                target: relation,
            }],
            column: "id",
            json_path: Vec::new(),
        }),
        literal(id.as_str()),
    )
}

/// Rows with one of the given identifiers.
fn one_of<'a>(ids: impl IntoIterator<Item = &'a EntityId>) -> Predicate {
    any_of(
        ids.into_iter()
            .map(|id| eq(column("id"), literal(id.as_str())))
            .collect(),
    )
}

/// Predicate selecting the `child` entities related to one parent.
///
/// Fails with NotFound if the parent does not exist and with
/// InvalidRequest if the two entity types are not related.
pub fn scope(
    tables: &Tables,
    parent: EntityKind,
    parent_id: &EntityId,
    child: EntityKind,
) -> StaResult<Predicate> {
    use EntityKind as K;

    let predicate = match (parent, child) {
        (K::Thing, K::Location) => one_of(&tables.get::<Thing>(parent_id)?.locations),
        (K::Thing, K::Datastream) => {
            tables.get::<Thing>(parent_id)?;
            related("Thing", parent_id)
        }
        (K::Thing, K::HistoricalLocation) => {
            tables.get::<Thing>(parent_id)?;
            related("Thing", parent_id)
        }
        (K::Location, K::Thing) => {
            tables.get::<Location>(parent_id)?;
            let things: Vec<&EntityId> = tables
                .things
                .iter()
                .filter(|t| t.locations.contains(parent_id))
                .map(|t| &t.id)
                .collect();
            one_of(things)
        }
        (K::Location, K::HistoricalLocation) => {
            one_of(&tables.get::<Location>(parent_id)?.historical_locations)
        }
        (K::HistoricalLocation, K::Thing) => {
            one_of([&tables.get::<HistoricalLocation>(parent_id)?.thing_id])
        }
        (K::HistoricalLocation, K::Location) => {
            one_of(&tables.get::<HistoricalLocation>(parent_id)?.location_ids)
        }
        (K::Sensor, K::Datastream) => {
            tables.get::<Sensor>(parent_id)?;
            related("Sensor", parent_id)
        }
        (K::ObservedProperty, K::Datastream) => {
            tables.get::<ObservedProperty>(parent_id)?;
            related("ObservedProperty", parent_id)
        }
        (K::Datastream, K::Thing) => one_of([&tables.get::<Datastream>(parent_id)?.thing_id]),
        (K::Datastream, K::Sensor) => one_of([&tables.get::<Datastream>(parent_id)?.sensor_id]),
        (K::Datastream, K::ObservedProperty) => {
            one_of([&tables.get::<Datastream>(parent_id)?.observed_property_id])
        }
        (K::Datastream, K::Observation) => {
            tables.get::<Datastream>(parent_id)?;
            related("Datastream", parent_id)
        }
        (K::FeatureOfInterest, K::Observation) => {
            tables.get::<FeatureOfInterest>(parent_id)?;
            related("FeatureOfInterest", parent_id)
        }
        (K::Observation, K::Datastream) => {
            one_of([&tables.get::<Observation>(parent_id)?.datastream_id])
        }
        (K::Observation, K::FeatureOfInterest) => {
            one_of([&tables.get::<Observation>(parent_id)?.feature_id])
        }
        _ => {
            return Err(StaError::invalid(format!(
                "{} has no navigation to {}",
                parent, child
            )))
        }
    };
    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::EntityStore;

    fn thing(id: &str, locations: &[&str]) -> Thing {
        Thing {
            id: EntityId::new(id),
            name: id.to_string(),
            description: "test".to_string(),
            properties: None,
            locations: locations.iter().map(|l| EntityId::new(*l)).collect(),
        }
    }

    #[test]
    fn test_thing_locations_scope() {
        let mut store = EntityStore::new();
        let mut tx = store.begin();
        tx.save(thing("t1", &["l1"]));
        tx.save(thing("t2", &[]));
        tx.commit().unwrap();

        let predicate = scope(
            store.tables(),
            EntityKind::Thing,
            &EntityId::new("t2"),
            EntityKind::Location,
        )
        .unwrap();
        assert_eq!(predicate, Predicate::Const(false));

        let predicate = scope(
            store.tables(),
            EntityKind::Location,
            &EntityId::new("missing"),
            EntityKind::Thing,
        );
        assert!(predicate.is_err());
    }

    #[test]
    fn test_unrelated_kinds_rejected() {
        let mut store = EntityStore::new();
        let mut tx = store.begin();
        tx.save(thing("t1", &[]));
        tx.commit().unwrap();
        let err = scope(
            store.tables(),
            EntityKind::Thing,
            &EntityId::new("t1"),
            EntityKind::Sensor,
        )
        .unwrap_err();
        assert_eq!(err.kind(), sta_common::ErrorKind::InvalidRequest);
    }
}
