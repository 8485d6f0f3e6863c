use chrono::{DateTime, Utc};
use sta_common::{EntityId, StaError, StaResult};
use sta_model::{EntityKind, HistoricalLocation, HistoricalLocationPayload, Location};
use std::collections::BTreeSet;
use tracing::debug;

use crate::cascade;
use crate::context::Context;
use crate::service::{claim_id, reference, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct HistoricalLocationService;

impl HistoricalLocationService {
    /// Snapshot a Thing's location set at `time`.
    pub(crate) fn record(
        &self,
        ctx: &mut Context<'_>,
        thing_id: &EntityId,
        location_ids: impl IntoIterator<Item = EntityId>,
        time: DateTime<Utc>,
    ) -> StaResult<EntityId> {
        self.insert(
            ctx,
            HistoricalLocation {
                id: EntityId::generate(),
                time,
                thing_id: thing_id.clone(),
                location_ids: location_ids.into_iter().collect(),
            },
        )
    }

    /// Add a Location to an existing HistoricalLocation.
    pub(crate) fn link(
        &self,
        ctx: &mut Context<'_>,
        historical_id: &EntityId,
        location_id: &EntityId,
    ) -> StaResult<()> {
        let mut historical = ctx.tx.get::<HistoricalLocation>(historical_id)?.clone();
        historical.location_ids.insert(location_id.clone());
        ctx.tx.save(historical);
        backlink(ctx, historical_id, location_id)
    }

    fn insert(&self, ctx: &mut Context<'_>, historical: HistoricalLocation) -> StaResult<EntityId> {
        let id = historical.id.clone();
        let location_ids = historical.location_ids.clone();
        ctx.tx.save(historical);
        for location_id in &location_ids {
            backlink(ctx, &id, location_id)?;
        }
        debug!(
            historical_location = %id,
            locations = location_ids.len(),
            "Recorded historical location"
        );
        Ok(id)
    }
}

fn backlink(ctx: &mut Context<'_>, historical_id: &EntityId, location_id: &EntityId) -> StaResult<()> {
    let mut location = ctx.tx.get::<Location>(location_id)?.clone();
    if location.historical_locations.insert(historical_id.clone()) {
        ctx.tx.save(location);
    }
    Ok(())
}

impl EntityService for HistoricalLocationService {
    type Entity = HistoricalLocation;
    type Payload = HistoricalLocationPayload;

    fn create(
        &self,
        ctx: &mut Context<'_>,
        payload: HistoricalLocationPayload,
    ) -> StaResult<EntityId> {
        if let Some(id) = reference::<HistoricalLocation>(ctx, &payload)? {
            return Ok(id);
        }
        let HistoricalLocationPayload {
            id,
            time,
            thing,
            locations,
        } = payload;

        let time = require(time, EntityKind::HistoricalLocation, "time")?;
        let thing = require(thing, EntityKind::HistoricalLocation, "Thing")?;
        let locations = locations.unwrap_or_default();
        if locations.is_empty() {
            return Err(StaError::missing_field(
                EntityKind::HistoricalLocation.name(),
                "Locations",
            ));
        }
        let id = claim_id::<HistoricalLocation>(ctx, id)?;

        let services = ctx.services;
        let thing_id = services.things.create(ctx, *thing)?;
        let mut location_ids = BTreeSet::new();
        for location in locations {
            location_ids.insert(services.locations.create(ctx, location)?);
        }

        self.insert(
            ctx,
            HistoricalLocation {
                id,
                time,
                thing_id,
                location_ids,
            },
        )
    }

    fn merge(
        &self,
        ctx: &mut Context<'_>,
        id: &EntityId,
        patch: HistoricalLocationPayload,
    ) -> StaResult<()> {
        let mut historical = ctx.tx.get::<HistoricalLocation>(id)?.clone();
        reject_nested_bodies(EntityKind::HistoricalLocation, &patch)?;
        if patch.thing.is_some() || patch.locations.is_some() {
            return Err(StaError::invalid(
                "the Thing and Locations of a HistoricalLocation cannot be changed",
            ));
        }
        if let Some(time) = patch.time {
            historical.time = time;
        }
        ctx.tx.save(historical);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_historical_location(ctx, id)
    }
}
