//! Contract shared by the entity services, plus the helpers they build on.

use serde::de::DeserializeOwned;
use sta_common::{EntityId, StaError, StaResult};
use sta_filter::QueryPlan;
use sta_model::{EntityKind, Payload};
use storage::{Entity, Page, Tables};

use crate::context::Context;

/// Create, merge and delete for one entity type.
///
/// Writes go through a [`Context`] so nested entities created on the way
/// share the caller's transaction. Reads work on any [`Tables`] snapshot.
pub trait EntityService {
    type Entity: Entity;
    type Payload: Payload + DeserializeOwned;

    /// Create an entity graph, or resolve a reference-only payload.
    fn create(&self, ctx: &mut Context<'_>, payload: Self::Payload) -> StaResult<EntityId>;

    /// Apply the fields present in `patch`.
    fn merge(&self, ctx: &mut Context<'_>, id: &EntityId, patch: Self::Payload) -> StaResult<()>;

    /// Delete an entity together with everything that depends on it.
    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()>;

    /// Whole-resource replacement.
    fn replace(
        &self,
        _ctx: &mut Context<'_>,
        _id: &EntityId,
        _payload: Self::Payload,
    ) -> StaResult<()> {
        Err(StaError::unsupported(format!(
            "replacing a {} is not supported, use PATCH",
            Self::Entity::KIND
        )))
    }

    fn get<'t>(&self, tables: &'t Tables, id: &EntityId) -> StaResult<&'t Self::Entity> {
        tables.get(id)
    }

    fn query<'t>(&self, tables: &'t Tables, plan: &QueryPlan) -> Page<'t, Self::Entity> {
        tables.query(plan)
    }
}

/// Resolve a reference-only payload to its existing entity.
///
/// Returns `None` when the payload carries fields and should be created.
pub(crate) fn reference<T: Entity>(
    ctx: &Context<'_>,
    payload: &impl Payload,
) -> StaResult<Option<EntityId>> {
    match payload.id() {
        Some(id) if payload.is_reference() => {
            ctx.tx.get::<T>(id)?;
            Ok(Some(id.clone()))
        }
        _ => Ok(None),
    }
}

/// Take the client's identifier if it is free, or generate one.
pub(crate) fn claim_id<T: Entity>(ctx: &Context<'_>, id: Option<EntityId>) -> StaResult<EntityId> {
    match id {
        Some(id) if ctx.tx.exists::<T>(&id) => Err(StaError::conflict(T::KIND.name(), id)),
        Some(id) => Ok(id),
        None => Ok(EntityId::generate()),
    }
}

pub(crate) fn require<V>(value: Option<V>, kind: EntityKind, field: &str) -> StaResult<V> {
    value.ok_or_else(|| StaError::missing_field(kind.name(), field))
}

/// Reject a patch carrying related entities that are more than references.
pub(crate) fn reject_nested_bodies(kind: EntityKind, patch: &impl Payload) -> StaResult<()> {
    if patch.has_nested_bodies() {
        return Err(StaError::invalid(format!(
            "a {} patch may only reference related entities by @iot.id",
            kind
        )));
    }
    Ok(())
}

/// The identifier of a reference given in a patch.
pub(crate) fn referenced_id(kind: EntityKind, payload: &impl Payload) -> StaResult<EntityId> {
    payload
        .id()
        .cloned()
        .ok_or_else(|| StaError::invalid(format!("{} reference is missing @iot.id", kind)))
}

/// Identifiers of all rows of `T` accepted by `keep`.
pub(crate) fn ids_where<T: Entity>(tables: &Tables, keep: impl Fn(&T) -> bool) -> Vec<EntityId> {
    T::table(tables)
        .iter()
        .filter(|row| keep(row))
        .map(|row| row.id().clone())
        .collect()
}
