//! Store-plus-services harness shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sta_common::{EntityId, StaResult};
use sta_core::{Context, CoreConfig, ServiceRegistry};
use sta_model::{EntityKind, Thing};
use storage::{Entity, EntityStore, Tables};
use test_utils::{datastream, epoch, location, observed_property, reference, sensor, thing, with};

/// Identifiers of the graph created by [`Harness::seed`].
pub struct Seeded {
    pub thing: EntityId,
    pub location: EntityId,
    pub sensor: EntityId,
    pub observed_property: EntityId,
    pub datastream: EntityId,
}

pub struct Harness {
    pub store: EntityStore,
    pub services: ServiceRegistry,
    pub now: DateTime<Utc>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            store: EntityStore::new(),
            services: ServiceRegistry::new(config),
            now: epoch(),
        }
    }

    /// Run one operation in its own transaction, committing only on success.
    pub fn run<R>(
        &mut self,
        op: impl FnOnce(&ServiceRegistry, &mut Context<'_>) -> StaResult<R>,
    ) -> StaResult<R> {
        let mut ctx = self.services.context(self.store.begin(), self.now);
        let value = op(&self.services, &mut ctx)?;
        ctx.into_transaction().commit()?;
        Ok(value)
    }

    pub fn create(&mut self, kind: EntityKind, body: Value) -> StaResult<EntityId> {
        self.run(|services, ctx| services.create(ctx, kind, body))
    }

    pub fn merge(&mut self, kind: EntityKind, id: &EntityId, body: Value) -> StaResult<()> {
        self.run(|services, ctx| services.merge(ctx, kind, id, body))
    }

    pub fn delete(&mut self, kind: EntityKind, id: &EntityId) -> StaResult<()> {
        self.run(|services, ctx| services.delete(ctx, kind, id))
    }

    pub fn tables(&self) -> &Tables {
        self.store.tables()
    }

    pub fn get<T: Entity>(&self, id: &EntityId) -> &T {
        self.tables()
            .find(id)
            .unwrap_or_else(|| panic!("{} {} missing", T::KIND, id))
    }

    pub fn count<T: Entity>(&self) -> usize {
        T::table(self.tables()).len()
    }

    /// A Thing at "home" (7, 51) with one temperature Datastream.
    pub fn seed(&mut self) -> Seeded {
        let thing_id = self
            .create(
                EntityKind::Thing,
                with(thing("station"), "Locations", json!([location("home", 7.0, 51.0)])),
            )
            .expect("seed thing");
        let location_id = self.get::<Thing>(&thing_id).locations[0].clone();
        let sensor_id = self
            .create(EntityKind::Sensor, sensor("thermometer"))
            .expect("seed sensor");
        let observed_property_id = self
            .create(EntityKind::ObservedProperty, observed_property("temperature"))
            .expect("seed observed property");
        let datastream_id = self
            .create(
                EntityKind::Datastream,
                datastream(
                    "air temperature",
                    reference(thing_id.as_str()),
                    reference(sensor_id.as_str()),
                    reference(observed_property_id.as_str()),
                ),
            )
            .expect("seed datastream");
        Seeded {
            thing: thing_id,
            location: location_id,
            sensor: sensor_id,
            observed_property: observed_property_id,
            datastream: datastream_id,
        }
    }

    /// Create the Observations of a series and return their identifiers.
    pub fn observe(&mut self, bodies: Vec<Value>) -> Vec<EntityId> {
        bodies
            .into_iter()
            .map(|body| {
                self.create(EntityKind::Observation, body)
                    .expect("create observation")
            })
            .collect()
    }
}
