use sta_common::{EntityId, StaError, StaResult};
use sta_model::{EntityKind, Sensor, SensorPayload};
use tracing::debug;

use super::datastream::{self, Owner};
use crate::cascade;
use crate::context::Context;
use crate::service::{claim_id, reference, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct SensorService;

impl EntityService for SensorService {
    type Entity = Sensor;
    type Payload = SensorPayload;

    fn create(&self, ctx: &mut Context<'_>, payload: SensorPayload) -> StaResult<EntityId> {
        if let Some(id) = reference::<Sensor>(ctx, &payload)? {
            return Ok(id);
        }
        let SensorPayload {
            id,
            name,
            description,
            encoding_type,
            metadata,
            properties,
            datastreams,
        } = payload;

        let sensor = Sensor {
            id: claim_id::<Sensor>(ctx, id)?,
            name: require(name, EntityKind::Sensor, "name")?,
            description: require(description, EntityKind::Sensor, "description")?,
            encoding_type: require(encoding_type, EntityKind::Sensor, "encodingType")?,
            metadata: require(metadata, EntityKind::Sensor, "metadata")?,
            properties,
        };
        let id = sensor.id.clone();
        ctx.tx.save(sensor);
        debug!(sensor = %id, "Created sensor");

        datastream::attach(ctx, Owner::Sensor, &id, datastreams.unwrap_or_default())?;
        Ok(id)
    }

    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: SensorPayload) -> StaResult<()> {
        let mut sensor = ctx.tx.get::<Sensor>(id)?.clone();
        reject_nested_bodies(EntityKind::Sensor, &patch)?;
        if patch.datastreams.is_some() {
            return Err(StaError::invalid(
                "Datastreams cannot be changed through a Sensor patch",
            ));
        }

        if let Some(name) = patch.name {
            sensor.name = name;
        }
        if let Some(description) = patch.description {
            sensor.description = description;
        }
        if let Some(encoding_type) = patch.encoding_type {
            sensor.encoding_type = encoding_type;
        }
        if let Some(metadata) = patch.metadata {
            sensor.metadata = metadata;
        }
        if let Some(properties) = patch.properties {
            sensor.properties = Some(properties);
        }
        ctx.tx.save(sensor);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_sensor(ctx, id)
    }
}
