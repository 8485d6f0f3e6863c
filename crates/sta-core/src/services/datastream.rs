use sta_common::{EntityId, StaError, StaResult};
use sta_filter::builder::{column, eq, literal};
use sta_model::{
    Datastream, DatastreamPayload, EntityKind, Format, ObservedPropertyPayload, Payload,
    SensorPayload, ThingPayload, UnitOfMeasurement, UnitOfMeasurementPayload,
};
use tracing::debug;

use crate::cascade;
use crate::context::Context;
use crate::dispatcher;
use crate::service::{claim_id, reference, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct DatastreamService;

/// The entity a nested Datastream list hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Thing,
    Sensor,
    ObservedProperty,
}

/// Create or re-link the Datastreams nested in an owner's payload.
///
/// Bodies get the owner threaded in as a reference. References to
/// existing Datastreams are re-pointed at the owner.
pub(crate) fn attach(
    ctx: &mut Context<'_>,
    owner: Owner,
    owner_id: &EntityId,
    datastreams: Vec<DatastreamPayload>,
) -> StaResult<()> {
    let services = ctx.services;
    for mut payload in datastreams {
        if let Some(id) = reference::<Datastream>(ctx, &payload)? {
            let mut datastream = ctx.tx.get::<Datastream>(&id)?.clone();
            match owner {
                Owner::Thing => datastream.thing_id = owner_id.clone(),
                Owner::Sensor => datastream.sensor_id = owner_id.clone(),
                Owner::ObservedProperty => datastream.observed_property_id = owner_id.clone(),
            }
            ctx.tx.save(datastream);
            continue;
        }
        match owner {
            Owner::Thing => {
                payload.thing = Some(Box::new(ThingPayload::reference(owner_id.clone())))
            }
            Owner::Sensor => {
                payload.sensor = Some(Box::new(SensorPayload::reference(owner_id.clone())))
            }
            Owner::ObservedProperty => {
                payload.observed_property =
                    Some(Box::new(ObservedPropertyPayload::reference(owner_id.clone())))
            }
        }
        services.datastreams.create(ctx, payload)?;
    }
    Ok(())
}

/// Unit row for a unit-of-measurement object, shared by symbol.
fn unit_record(ctx: &mut Context<'_>, unit: UnitOfMeasurementPayload) -> EntityId {
    if let Some(symbol) = unit.symbol.as_deref() {
        if let Some(existing) =
            ctx.tx.find_one::<UnitOfMeasurement>(&eq(column("symbol"), literal(symbol)))
        {
            return existing.id.clone();
        }
    }
    let id = EntityId::generate();
    ctx.tx.save(UnitOfMeasurement {
        id: id.clone(),
        name: unit.name,
        symbol: unit.symbol,
        definition: unit.definition,
    });
    id
}

/// Format row for an observation type URI, shared by URI.
fn format_record(ctx: &mut Context<'_>, format: String) -> EntityId {
    if let Some(existing) = ctx
        .tx
        .find_one::<Format>(&eq(column("format"), literal(format.as_str())))
    {
        return existing.id.clone();
    }
    let id = EntityId::generate();
    ctx.tx.save(Format {
        id: id.clone(),
        format,
    });
    id
}

/// A relation given in a Datastream patch must name the current target.
fn unchanged<P: Payload>(given: &Option<Box<P>>, current: &EntityId, relation: &str) -> StaResult<()> {
    match given {
        Some(payload) if payload.id() != Some(current) => Err(StaError::invalid(format!(
            "the {} of a Datastream cannot be changed",
            relation
        ))),
        _ => Ok(()),
    }
}

impl EntityService for DatastreamService {
    type Entity = Datastream;
    type Payload = DatastreamPayload;

    fn create(&self, ctx: &mut Context<'_>, payload: DatastreamPayload) -> StaResult<EntityId> {
        if let Some(id) = reference::<Datastream>(ctx, &payload)? {
            return Ok(id);
        }
        let DatastreamPayload {
            id,
            name,
            description,
            unit_of_measurement,
            observation_type,
            properties,
            thing,
            sensor,
            observed_property,
            observations,
        } = payload;

        let thing = require(thing, EntityKind::Datastream, "Thing")?;
        let sensor = require(sensor, EntityKind::Datastream, "Sensor")?;
        let observed_property = require(observed_property, EntityKind::Datastream, "ObservedProperty")?;
        let name = require(name, EntityKind::Datastream, "name")?;
        let description = require(description, EntityKind::Datastream, "description")?;
        let unit = require(unit_of_measurement, EntityKind::Datastream, "unitOfMeasurement")?;
        let observation_type = dispatcher::observation_type(&require(
            observation_type,
            EntityKind::Datastream,
            "observationType",
        )?)?;
        let id = claim_id::<Datastream>(ctx, id)?;

        let services = ctx.services;
        let thing_id = services.things.create(ctx, *thing)?;
        let sensor_id = services.sensors.create(ctx, *sensor)?;
        let observed_property_id = services.observed_properties.create(ctx, *observed_property)?;
        let unit_id = unit_record(ctx, unit);
        let format_id = format_record(ctx, observation_type.uri());

        ctx.tx.save(Datastream {
            id: id.clone(),
            name,
            description,
            observation_type,
            unit_id,
            format_id,
            thing_id,
            sensor_id,
            observed_property_id,
            phenomenon_time: None,
            result_time: None,
            properties,
        });
        debug!(datastream = %id, "Created datastream");

        for mut observation in observations.unwrap_or_default() {
            if observation.is_reference() {
                return Err(StaError::invalid(
                    "existing Observations cannot be moved to another Datastream",
                ));
            }
            observation.datastream = Some(Box::new(DatastreamPayload::reference(id.clone())));
            services.observations.create(ctx, observation)?;
        }
        Ok(id)
    }

    /// Thing, Sensor and ObservedProperty stay fixed; the unit of
    /// measurement may be replaced as a whole.
    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: DatastreamPayload) -> StaResult<()> {
        let mut datastream = ctx.tx.get::<Datastream>(id)?.clone();
        reject_nested_bodies(EntityKind::Datastream, &patch)?;
        unchanged(&patch.thing, &datastream.thing_id, "Thing")?;
        unchanged(&patch.sensor, &datastream.sensor_id, "Sensor")?;
        unchanged(
            &patch.observed_property,
            &datastream.observed_property_id,
            "ObservedProperty",
        )?;
        if patch.observations.is_some() {
            return Err(StaError::invalid(
                "Observations cannot be changed through a Datastream patch",
            ));
        }

        if let Some(name) = patch.name {
            datastream.name = name;
        }
        if let Some(description) = patch.description {
            datastream.description = description;
        }
        if let Some(properties) = patch.properties {
            datastream.properties = Some(properties);
        }
        if let Some(unit) = patch.unit_of_measurement {
            datastream.unit_id = unit_record(ctx, unit);
        }
        if let Some(uri) = patch.observation_type {
            let observation_type = dispatcher::observation_type(&uri)?;
            if observation_type != datastream.observation_type {
                let has_observations = ctx
                    .tx
                    .tables()
                    .observations
                    .iter()
                    .any(|o| o.datastream_id == *id);
                if has_observations {
                    return Err(StaError::invalid(
                        "observationType cannot change once a Datastream has Observations",
                    ));
                }
                datastream.observation_type = observation_type;
                datastream.format_id = format_record(ctx, observation_type.uri());
            }
        }
        ctx.tx.save(datastream);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_datastream(ctx, id)
    }
}
