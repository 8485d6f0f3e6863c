//! Delete cascades and recomputation of denormalized fields.
//!
//! Datastream time bounds and Dataset first/last pointers are extended
//! incrementally on insert. Any update or delete re-derives them from the
//! remaining Observations.

use sta_common::{EntityId, StaResult, TimeInterval};
use sta_filter::builder::{and, column, eq, literal};
use sta_model::{
    Dataset, Datastream, FeatureOfInterest, HistoricalLocation, Location, Observation,
    ObservationPointer, ObservedProperty, Sensor, Thing,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::context::Context;
use crate::service::ids_where;

/// The Dataset grouping a Datastream's Observations of one feature,
/// created on first use.
pub(crate) fn dataset_for(
    ctx: &mut Context<'_>,
    datastream: &Datastream,
    feature_id: &EntityId,
) -> StaResult<EntityId> {
    let key = and(
        eq(column("datastreamId"), literal(datastream.id.as_str())),
        eq(column("featureId"), literal(feature_id.as_str())),
    );
    if let Some(existing) = ctx.tx.find_one::<Dataset>(&key) {
        return Ok(existing.id.clone());
    }

    let dataset = Dataset {
        id: EntityId::generate(),
        datastream_id: datastream.id.clone(),
        procedure_id: datastream.sensor_id.clone(),
        phenomenon_id: datastream.observed_property_id.clone(),
        feature_id: feature_id.clone(),
        offering_id: datastream.id.clone(),
        first_observation: None,
        last_observation: None,
    };
    debug!(
        dataset = %dataset.id,
        datastream = %datastream.id,
        feature = %feature_id,
        "Created dataset"
    );
    let id = dataset.id.clone();
    ctx.tx.save(dataset);
    Ok(id)
}

fn first_pointer(obs: &Observation) -> ObservationPointer {
    ObservationPointer {
        observation_id: obs.id.clone(),
        time: obs.sampling_start(),
        value: obs.result.clone(),
    }
}

fn last_pointer(obs: &Observation) -> ObservationPointer {
    ObservationPointer {
        observation_id: obs.id.clone(),
        time: obs.sampling_end(),
        value: obs.result.clone(),
    }
}

fn earlier(obs: &Observation, current: &ObservationPointer) -> bool {
    (obs.sampling_start(), &obs.id) < (current.time, &current.observation_id)
}

fn later(obs: &Observation, current: &ObservationPointer) -> bool {
    (obs.sampling_end(), &obs.id) > (current.time, &current.observation_id)
}

/// Extend the Datastream bounds and Dataset pointers to cover a new
/// Observation.
pub(crate) fn observation_added(ctx: &mut Context<'_>, obs: &Observation) -> StaResult<()> {
    let mut datastream = ctx.tx.get::<Datastream>(&obs.datastream_id)?.clone();
    let sampled = obs.phenomenon_time.as_interval();
    let produced = TimeInterval::instant(obs.result_time);
    datastream.phenomenon_time = Some(match datastream.phenomenon_time {
        Some(bounds) => bounds.union(&sampled),
        None => sampled,
    });
    datastream.result_time = Some(match datastream.result_time {
        Some(bounds) => bounds.union(&produced),
        None => produced,
    });
    ctx.tx.save(datastream);

    let mut dataset = ctx.tx.get::<Dataset>(&obs.dataset_id)?.clone();
    if dataset
        .first_observation
        .as_ref()
        .map_or(true, |first| earlier(obs, first))
    {
        dataset.first_observation = Some(first_pointer(obs));
    }
    if dataset
        .last_observation
        .as_ref()
        .map_or(true, |last| later(obs, last))
    {
        dataset.last_observation = Some(last_pointer(obs));
    }
    ctx.tx.save(dataset);
    Ok(())
}

/// Re-derive state after an Observation was edited. `previous_dataset` is
/// the Dataset it belonged to before the edit.
pub(crate) fn observation_changed(
    ctx: &mut Context<'_>,
    previous_dataset: &EntityId,
    obs: &Observation,
) -> StaResult<()> {
    recompute_dataset(ctx, previous_dataset)?;
    if *previous_dataset != obs.dataset_id {
        recompute_dataset(ctx, &obs.dataset_id)?;
    }
    recompute_datastream(ctx, &obs.datastream_id)
}

/// Reset a Dataset's first/last pointers from its live Observations.
pub(crate) fn recompute_dataset(ctx: &mut Context<'_>, dataset_id: &EntityId) -> StaResult<()> {
    let Some(mut dataset) = ctx.tx.find::<Dataset>(dataset_id).cloned() else {
        return Ok(());
    };
    let members: Vec<&Observation> = ctx
        .tx
        .tables()
        .observations
        .iter()
        .filter(|o| o.dataset_id == *dataset_id)
        .collect();
    dataset.first_observation = members
        .iter()
        .min_by(|a, b| (a.sampling_start(), &a.id).cmp(&(b.sampling_start(), &b.id)))
        .map(|o| first_pointer(o));
    dataset.last_observation = members
        .iter()
        .max_by(|a, b| (a.sampling_end(), &a.id).cmp(&(b.sampling_end(), &b.id)))
        .map(|o| last_pointer(o));
    ctx.tx.save(dataset);
    Ok(())
}

/// Reset a Datastream's phenomenon and result time bounds from the
/// Observations left in its Datasets. No Observations leaves them unset.
pub(crate) fn recompute_datastream(ctx: &mut Context<'_>, datastream_id: &EntityId) -> StaResult<()> {
    let Some(mut datastream) = ctx.tx.find::<Datastream>(datastream_id).cloned() else {
        return Ok(());
    };
    let tables = ctx.tx.tables();
    let datasets: BTreeSet<EntityId> =
        ids_where::<Dataset>(tables, |d| d.datastream_id == *datastream_id)
            .into_iter()
            .collect();

    let mut phenomenon: Option<TimeInterval> = None;
    let mut result: Option<TimeInterval> = None;
    for obs in tables
        .observations
        .iter()
        .filter(|o| datasets.contains(&o.dataset_id))
    {
        let sampled = obs.phenomenon_time.as_interval();
        let produced = TimeInterval::instant(obs.result_time);
        phenomenon = Some(phenomenon.map_or(sampled, |b| b.union(&sampled)));
        result = Some(result.map_or(produced, |b| b.union(&produced)));
    }

    datastream.phenomenon_time = phenomenon;
    datastream.result_time = result;
    ctx.tx.save(datastream);
    Ok(())
}

/// Remove Datasets and all of their Observations, clearing the pointers
/// first.
fn purge_datasets(ctx: &mut Context<'_>, datasets: &[EntityId]) -> StaResult<usize> {
    for id in datasets {
        let mut dataset = ctx.tx.get::<Dataset>(id)?.clone();
        dataset.first_observation = None;
        dataset.last_observation = None;
        ctx.tx.save(dataset);
    }

    let members: BTreeSet<&EntityId> = datasets.iter().collect();
    let observations =
        ids_where::<Observation>(ctx.tx.tables(), |o| members.contains(&o.dataset_id));
    for id in &observations {
        ctx.tx.delete::<Observation>(id)?;
    }
    for id in datasets {
        ctx.tx.delete::<Dataset>(id)?;
    }
    Ok(observations.len())
}

pub(crate) fn delete_observation(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    let obs = ctx.tx.delete::<Observation>(id)?;
    recompute_dataset(ctx, &obs.dataset_id)?;
    recompute_datastream(ctx, &obs.datastream_id)?;
    debug!(observation = %id, datastream = %obs.datastream_id, "Deleted observation");
    Ok(())
}

pub(crate) fn delete_datastream(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    ctx.tx.get::<Datastream>(id)?;
    let datasets = ids_where::<Dataset>(ctx.tx.tables(), |d| d.datastream_id == *id);
    let observations = purge_datasets(ctx, &datasets)?;
    ctx.tx.delete::<Datastream>(id)?;
    info!(
        datastream = %id,
        datasets = datasets.len(),
        observations,
        "Deleted datastream"
    );
    Ok(())
}

pub(crate) fn delete_feature(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    ctx.tx.get::<FeatureOfInterest>(id)?;
    let tables = ctx.tx.tables();
    let datasets = ids_where::<Dataset>(tables, |d| d.feature_id == *id);
    let affected: BTreeSet<EntityId> = tables
        .datasets
        .iter()
        .filter(|d| d.feature_id == *id)
        .map(|d| d.datastream_id.clone())
        .collect();

    let observations = purge_datasets(ctx, &datasets)?;
    ctx.tx.delete::<FeatureOfInterest>(id)?;
    for datastream in &affected {
        recompute_datastream(ctx, datastream)?;
    }
    info!(
        feature = %id,
        datasets = datasets.len(),
        observations,
        "Deleted feature of interest"
    );
    Ok(())
}

pub(crate) fn delete_thing(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    ctx.tx.get::<Thing>(id)?;
    for datastream in ids_where::<Datastream>(ctx.tx.tables(), |d| d.thing_id == *id) {
        delete_datastream(ctx, &datastream)?;
    }
    for historical in ids_where::<HistoricalLocation>(ctx.tx.tables(), |h| h.thing_id == *id) {
        delete_historical_location(ctx, &historical)?;
    }
    ctx.tx.delete::<Thing>(id)?;
    info!(thing = %id, "Deleted thing");
    Ok(())
}

pub(crate) fn delete_sensor(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    ctx.tx.get::<Sensor>(id)?;
    for datastream in ids_where::<Datastream>(ctx.tx.tables(), |d| d.sensor_id == *id) {
        delete_datastream(ctx, &datastream)?;
    }
    ctx.tx.delete::<Sensor>(id)?;
    info!(sensor = %id, "Deleted sensor");
    Ok(())
}

pub(crate) fn delete_observed_property(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    ctx.tx.get::<ObservedProperty>(id)?;
    for datastream in
        ids_where::<Datastream>(ctx.tx.tables(), |d| d.observed_property_id == *id)
    {
        delete_datastream(ctx, &datastream)?;
    }
    ctx.tx.delete::<ObservedProperty>(id)?;
    info!(observed_property = %id, "Deleted observed property");
    Ok(())
}

/// Delete a HistoricalLocation, unlinking it from its Locations.
pub(crate) fn delete_historical_location(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    let historical = ctx.tx.delete::<HistoricalLocation>(id)?;
    for location_id in &historical.location_ids {
        if let Some(mut location) = ctx.tx.find::<Location>(location_id).cloned() {
            location.historical_locations.remove(id);
            ctx.tx.save(location);
        }
    }
    debug!(historical_location = %id, "Deleted historical location");
    Ok(())
}

/// Delete a Location. Things drop it from their location set, and
/// HistoricalLocations that referenced only this Location go with it.
pub(crate) fn delete_location(ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
    let location = ctx.tx.delete::<Location>(id)?;

    for thing_id in ids_where::<Thing>(ctx.tx.tables(), |t| t.locations.contains(id)) {
        let mut thing = ctx.tx.get::<Thing>(&thing_id)?.clone();
        thing.locations.retain(|l| l != id);
        ctx.tx.save(thing);
    }

    let mut emptied = 0;
    for historical_id in &location.historical_locations {
        let Some(mut historical) = ctx.tx.find::<HistoricalLocation>(historical_id).cloned() else {
            continue;
        };
        historical.location_ids.remove(id);
        if historical.location_ids.is_empty() {
            ctx.tx.delete::<HistoricalLocation>(historical_id)?;
            emptied += 1;
        } else {
            ctx.tx.save(historical);
        }
    }
    info!(location = %id, historical_locations_removed = emptied, "Deleted location");
    Ok(())
}
