use sta_common::{EntityId, StaError, StaResult};
use sta_model::{EntityKind, Location, Payload, Thing, ThingPayload};
use tracing::debug;

use super::datastream::{self, Owner};
use crate::cascade;
use crate::context::Context;
use crate::service::{claim_id, reference, referenced_id, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct ThingService;

impl EntityService for ThingService {
    type Entity = Thing;
    type Payload = ThingPayload;

    fn create(&self, ctx: &mut Context<'_>, payload: ThingPayload) -> StaResult<EntityId> {
        if let Some(id) = reference::<Thing>(ctx, &payload)? {
            return Ok(id);
        }
        let ThingPayload {
            id,
            name,
            description,
            properties,
            locations,
            datastreams,
            historical_locations,
        } = payload;

        let name = require(name, EntityKind::Thing, "name")?;
        let description = require(description, EntityKind::Thing, "description")?;
        let id = claim_id::<Thing>(ctx, id)?;
        ctx.tx.save(Thing {
            id: id.clone(),
            name,
            description,
            properties,
            locations: Vec::new(),
        });

        let services = ctx.services;
        let mut location_ids = Vec::new();
        for location in locations.unwrap_or_default() {
            let location_id = services.locations.create(ctx, location)?;
            if !location_ids.contains(&location_id) {
                location_ids.push(location_id);
            }
        }
        if !location_ids.is_empty() {
            move_to(ctx, &id, location_ids)?;
        }

        datastream::attach(ctx, Owner::Thing, &id, datastreams.unwrap_or_default())?;

        for mut historical in historical_locations.unwrap_or_default() {
            if historical.is_reference() {
                return Err(StaError::invalid(
                    "existing HistoricalLocations cannot be moved to another Thing",
                ));
            }
            historical.thing = Some(Box::new(ThingPayload::reference(id.clone())));
            services.historical_locations.create(ctx, historical)?;
        }

        debug!(thing = %id, "Created thing");
        Ok(id)
    }

    /// Besides plain fields, a patch may list reference-only Locations,
    /// which moves the Thing there.
    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: ThingPayload) -> StaResult<()> {
        let mut thing = ctx.tx.get::<Thing>(id)?.clone();
        reject_nested_bodies(EntityKind::Thing, &patch)?;
        if patch.datastreams.is_some() || patch.historical_locations.is_some() {
            return Err(StaError::invalid(
                "Datastreams and HistoricalLocations cannot be changed through a Thing patch",
            ));
        }

        if let Some(name) = patch.name {
            thing.name = name;
        }
        if let Some(description) = patch.description {
            thing.description = description;
        }
        if let Some(properties) = patch.properties {
            thing.properties = Some(properties);
        }
        ctx.tx.save(thing);

        if let Some(locations) = patch.locations {
            let mut location_ids = Vec::new();
            for location in &locations {
                let location_id = referenced_id(EntityKind::Location, location)?;
                ctx.tx.get::<Location>(&location_id)?;
                if !location_ids.contains(&location_id) {
                    location_ids.push(location_id);
                }
            }
            move_to(ctx, id, location_ids)?;
        }
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_thing(ctx, id)
    }
}

/// Replace a Thing's current Locations and record the move.
///
/// Returns false, recording nothing, if the set is unchanged.
pub(crate) fn move_to(
    ctx: &mut Context<'_>,
    thing_id: &EntityId,
    location_ids: Vec<EntityId>,
) -> StaResult<bool> {
    let mut thing = ctx.tx.get::<Thing>(thing_id)?.clone();
    if thing.locations == location_ids {
        return Ok(false);
    }
    thing.locations = location_ids.clone();
    ctx.tx.save(thing);

    if !location_ids.is_empty() {
        let services = ctx.services;
        let now = ctx.now;
        services
            .historical_locations
            .record(ctx, thing_id, location_ids, now)?;
    }
    debug!(thing = %thing_id, "Thing moved");
    Ok(true)
}
