use sta_common::{EntityId, StaError, StaResult};
use sta_filter::builder::{column, eq, literal};
use sta_model::{EntityKind, Location, LocationPayload, Payload};
use std::collections::BTreeSet;
use tracing::debug;

use super::thing;
use crate::cascade;
use crate::context::Context;
use crate::service::{
    claim_id, reference, referenced_id, reject_nested_bodies, require, EntityService,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocationService;

impl LocationService {
    fn by_name(ctx: &Context<'_>, name: &str) -> Option<EntityId> {
        ctx.tx
            .find_one::<Location>(&eq(column("name"), literal(name)))
            .map(|l| l.id.clone())
    }
}

impl EntityService for LocationService {
    type Entity = Location;
    type Payload = LocationPayload;

    /// Without an explicit identifier, a Location whose name is already
    /// taken resolves to the existing row. Any Things listed are moved to
    /// the Location.
    fn create(&self, ctx: &mut Context<'_>, payload: LocationPayload) -> StaResult<EntityId> {
        if let Some(id) = reference::<Location>(ctx, &payload)? {
            return Ok(id);
        }
        let LocationPayload {
            id,
            name,
            description,
            encoding_type,
            location,
            properties,
            things,
            historical_locations,
        } = payload;

        let name = require(name, EntityKind::Location, "name")?;
        let existing = match id {
            None => Self::by_name(ctx, &name),
            Some(_) => None,
        };
        let location_id = match existing {
            Some(existing) => {
                debug!(location = %existing, name = %name, "Reusing location by name");
                existing
            }
            None => {
                let description = require(description, EntityKind::Location, "description")?;
                let encoding_type = require(encoding_type, EntityKind::Location, "encodingType")?;
                let geometry = require(location, EntityKind::Location, "location")?.into_geometry();
                let id = claim_id::<Location>(ctx, id)?;
                ctx.tx.save(Location {
                    id: id.clone(),
                    name,
                    description,
                    encoding_type,
                    location: geometry,
                    properties,
                    historical_locations: BTreeSet::new(),
                });
                debug!(location = %id, "Created location");
                id
            }
        };

        let services = ctx.services;
        for thing_payload in things.unwrap_or_default() {
            let thing_id = services.things.create(ctx, thing_payload)?;
            thing::move_to(ctx, &thing_id, vec![location_id.clone()])?;
        }

        for mut historical in historical_locations.unwrap_or_default() {
            if historical.is_reference() {
                let historical_id = referenced_id(EntityKind::HistoricalLocation, &historical)?;
                services
                    .historical_locations
                    .link(ctx, &historical_id, &location_id)?;
                continue;
            }
            historical
                .locations
                .get_or_insert_with(Vec::new)
                .push(LocationPayload::reference(location_id.clone()));
            services.historical_locations.create(ctx, historical)?;
        }

        Ok(location_id)
    }

    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: LocationPayload) -> StaResult<()> {
        let mut location = ctx.tx.get::<Location>(id)?.clone();
        reject_nested_bodies(EntityKind::Location, &patch)?;
        if patch.things.is_some() || patch.historical_locations.is_some() {
            return Err(StaError::invalid(
                "Things are moved through a Thing patch, not a Location patch",
            ));
        }

        if let Some(name) = patch.name {
            location.name = name;
        }
        if let Some(description) = patch.description {
            location.description = description;
        }
        if let Some(encoding_type) = patch.encoding_type {
            location.encoding_type = encoding_type;
        }
        if let Some(geometry) = patch.location {
            location.location = geometry.into_geometry();
        }
        if let Some(properties) = patch.properties {
            location.properties = Some(properties);
        }
        ctx.tx.save(location);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_location(ctx, id)
    }
}
