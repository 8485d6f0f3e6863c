use sta_common::{EntityId, Geometry, StaError, StaResult};
use sta_filter::builder::{and, column, eq, literal};
use sta_model::{EntityKind, FeatureOfInterest, FeatureOfInterestPayload, Location, Payload, Thing};
use tracing::{debug, info};

use crate::cascade;
use crate::context::Context;
use crate::service::{claim_id, reference, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureOfInterestService;

/// A feature with the same geometry and description, if one exists.
fn find_same(ctx: &Context<'_>, feature: &Geometry, description: &str) -> Option<EntityId> {
    let same = and(
        eq(column("feature"), literal(feature.clone())),
        eq(column("description"), literal(description)),
    );
    ctx.tx
        .find_one::<FeatureOfInterest>(&same)
        .map(|f| f.id.clone())
}

/// Resolve the feature for an Observation that names none, from the
/// Thing's most recent Location.
///
/// Reuses any feature with the Location's geometry and description.
/// Otherwise a new auto-generated feature is created, taking the
/// Location's identifier when that is free.
pub(crate) fn derive_for_thing(ctx: &mut Context<'_>, thing_id: &EntityId) -> StaResult<EntityId> {
    let thing = ctx.tx.get::<Thing>(thing_id)?;
    let location_id = thing.current_location().cloned().ok_or_else(|| {
        StaError::invalid(format!(
            "Observation has no FeatureOfInterest and Thing {} has no Location",
            thing_id
        ))
    })?;
    let location = ctx.tx.get::<Location>(&location_id)?.clone();

    if let Some(existing) = find_same(ctx, &location.location, &location.description) {
        debug!(feature = %existing, location = %location.id, "Reusing derived feature");
        return Ok(existing);
    }

    let id = if ctx.tx.exists::<FeatureOfInterest>(&location.id) {
        EntityId::generate()
    } else {
        location.id.clone()
    };
    ctx.tx.save(FeatureOfInterest {
        id: id.clone(),
        name: location.name,
        description: location.description,
        feature_type: location.encoding_type,
        feature: location.location,
        properties: location.properties,
        auto_generated: true,
    });
    info!(feature = %id, thing = %thing_id, "Derived feature of interest from location");
    Ok(id)
}

impl EntityService for FeatureOfInterestService {
    type Entity = FeatureOfInterest;
    type Payload = FeatureOfInterestPayload;

    /// Features are unique by (geometry, description). An explicit
    /// identifier may repeat only an identical auto-generated feature.
    fn create(
        &self,
        ctx: &mut Context<'_>,
        payload: FeatureOfInterestPayload,
    ) -> StaResult<EntityId> {
        if let Some(id) = reference::<FeatureOfInterest>(ctx, &payload)? {
            return Ok(id);
        }
        let FeatureOfInterestPayload {
            id,
            name,
            description,
            encoding_type,
            feature,
            properties,
            observations,
        } = payload;

        let name = require(name, EntityKind::FeatureOfInterest, "name")?;
        let description = require(description, EntityKind::FeatureOfInterest, "description")?;
        let encoding_type = require(encoding_type, EntityKind::FeatureOfInterest, "encodingType")?;
        let feature = require(feature, EntityKind::FeatureOfInterest, "feature")?.into_geometry();

        let reused = match &id {
            None => find_same(ctx, &feature, &description),
            Some(id) => match ctx.tx.find::<FeatureOfInterest>(id) {
                Some(existing)
                    if existing.auto_generated
                        && existing.feature == feature
                        && existing.description == description =>
                {
                    Some(id.clone())
                }
                _ => None,
            },
        };
        let feature_id = match reused {
            Some(existing) => {
                debug!(feature = %existing, "Reusing feature of interest");
                existing
            }
            None => {
                let id = claim_id::<FeatureOfInterest>(ctx, id)?;
                ctx.tx.save(FeatureOfInterest {
                    id: id.clone(),
                    name,
                    description,
                    feature_type: encoding_type,
                    feature,
                    properties,
                    auto_generated: false,
                });
                debug!(feature = %id, "Created feature of interest");
                id
            }
        };

        let services = ctx.services;
        for mut observation in observations.unwrap_or_default() {
            if observation.is_reference() {
                return Err(StaError::invalid(
                    "existing Observations are re-pointed through an Observation patch",
                ));
            }
            observation.feature_of_interest = Some(Box::new(FeatureOfInterestPayload::reference(
                feature_id.clone(),
            )));
            services.observations.create(ctx, observation)?;
        }
        Ok(feature_id)
    }

    fn merge(
        &self,
        ctx: &mut Context<'_>,
        id: &EntityId,
        patch: FeatureOfInterestPayload,
    ) -> StaResult<()> {
        let mut feature = ctx.tx.get::<FeatureOfInterest>(id)?.clone();
        reject_nested_bodies(EntityKind::FeatureOfInterest, &patch)?;
        if patch.observations.is_some() {
            return Err(StaError::invalid(
                "Observations cannot be changed through a FeatureOfInterest patch",
            ));
        }

        if let Some(name) = patch.name {
            feature.name = name;
        }
        if let Some(description) = patch.description {
            feature.description = description;
        }
        if let Some(encoding_type) = patch.encoding_type {
            feature.feature_type = encoding_type;
        }
        if let Some(geometry) = patch.feature {
            feature.feature = geometry.into_geometry();
        }
        if let Some(properties) = patch.properties {
            feature.properties = Some(properties);
        }
        ctx.tx.save(feature);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_feature(ctx, id)
    }
}
