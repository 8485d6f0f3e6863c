use sta_common::{EntityId, StaError, StaResult, TimeValue};
use sta_model::{
    Datastream, EntityKind, FeatureOfInterest, Observation, ObservationPayload, Payload,
};
use tracing::debug;

use super::feature_of_interest;
use crate::cascade;
use crate::context::Context;
use crate::dispatcher;
use crate::service::{
    claim_id, reference, referenced_id, reject_nested_bodies, require, EntityService,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct ObservationService;

impl EntityService for ObservationService {
    type Entity = Observation;
    type Payload = ObservationPayload;

    /// Missing times default to now (phenomenonTime) and to the end of the
    /// phenomenon time (resultTime). Without a FeatureOfInterest one is
    /// derived from the Thing's current Location.
    fn create(&self, ctx: &mut Context<'_>, payload: ObservationPayload) -> StaResult<EntityId> {
        if let Some(id) = reference::<Observation>(ctx, &payload)? {
            return Ok(id);
        }
        let ObservationPayload {
            id,
            phenomenon_time,
            result_time,
            valid_time,
            parameters,
            result,
            datastream,
            feature_of_interest,
        } = payload;

        let datastream = require(datastream, EntityKind::Observation, "Datastream")?;
        let raw = require(result, EntityKind::Observation, "result")?;
        let id = claim_id::<Observation>(ctx, id)?;

        let services = ctx.services;
        let datastream_id = services.datastreams.create(ctx, *datastream)?;
        let datastream = ctx.tx.get::<Datastream>(&datastream_id)?.clone();
        let result = dispatcher::parse_result(datastream.observation_type, &raw)?;

        let feature_id = match feature_of_interest {
            Some(feature) => services.features.create(ctx, *feature)?,
            None if ctx.config().derive_feature_of_interest => {
                feature_of_interest::derive_for_thing(ctx, &datastream.thing_id)?
            }
            None => {
                return Err(StaError::missing_field(
                    EntityKind::Observation.name(),
                    "FeatureOfInterest",
                ))
            }
        };

        let phenomenon_time = phenomenon_time.unwrap_or(TimeValue::Instant(ctx.now));
        let result_time = result_time.unwrap_or_else(|| phenomenon_time.end());
        let dataset_id = cascade::dataset_for(ctx, &datastream, &feature_id)?;

        let observation = Observation {
            id: id.clone(),
            datastream_id,
            dataset_id,
            feature_id,
            phenomenon_time,
            result_time,
            valid_time,
            parameters,
            result,
        };
        ctx.tx.save(observation.clone());
        cascade::observation_added(ctx, &observation)?;
        debug!(observation = %id, datastream = %observation.datastream_id, "Created observation");
        Ok(id)
    }

    /// The Datastream is fixed. A reference-only FeatureOfInterest moves
    /// the Observation to that feature's Dataset.
    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: ObservationPayload) -> StaResult<()> {
        let mut observation = ctx.tx.get::<Observation>(id)?.clone();
        reject_nested_bodies(EntityKind::Observation, &patch)?;
        if let Some(datastream) = &patch.datastream {
            if datastream.id() != Some(&observation.datastream_id) {
                return Err(StaError::invalid(
                    "the Datastream of an Observation cannot be changed",
                ));
            }
        }
        let datastream = ctx.tx.get::<Datastream>(&observation.datastream_id)?.clone();
        let previous_dataset = observation.dataset_id.clone();

        if let Some(feature) = &patch.feature_of_interest {
            let feature_id = referenced_id(EntityKind::FeatureOfInterest, feature.as_ref())?;
            ctx.tx.get::<FeatureOfInterest>(&feature_id)?;
            if feature_id != observation.feature_id {
                observation.dataset_id = cascade::dataset_for(ctx, &datastream, &feature_id)?;
                observation.feature_id = feature_id;
            }
        }
        if let Some(phenomenon_time) = patch.phenomenon_time {
            observation.phenomenon_time = phenomenon_time;
        }
        if let Some(result_time) = patch.result_time {
            observation.result_time = result_time;
        }
        if let Some(valid_time) = patch.valid_time {
            observation.valid_time = Some(valid_time);
        }
        if let Some(parameters) = patch.parameters {
            observation.parameters = Some(parameters);
        }
        if let Some(raw) = &patch.result {
            observation.result = dispatcher::parse_result(datastream.observation_type, raw)?;
        }

        ctx.tx.save(observation.clone());
        cascade::observation_changed(ctx, &previous_dataset, &observation)
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_observation(ctx, id)
    }
}
