//! The set of entity services, built once and shared by reference.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sta_common::{EntityId, StaError, StaResult};
use sta_filter::{FilterEvaluator, Predicate, PropertyMap, QueryCompiler, QueryOptions, QueryPlan, SchemaRegistry};
use sta_model::{schema, EntityKind, ModelSchema};
use storage::{Entity, Tables, Transaction};
use tracing::debug;

use crate::config::CoreConfig;
use crate::context::Context;
use crate::service::EntityService;
use crate::services::{
    DatastreamService, FeatureOfInterestService, HistoricalLocationService, LocationService,
    ObservationService, ObservedPropertyService, SensorService, ThingService,
};

/// Identifiers of one page of a collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub ids: Vec<EntityId>,
    pub total: Option<usize>,
    pub has_more: bool,
}

/// Handles to every entity service. Services reach their siblings through
/// the registry carried in the [`Context`].
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    pub things: ThingService,
    pub locations: LocationService,
    pub historical_locations: HistoricalLocationService,
    pub sensors: SensorService,
    pub observed_properties: ObservedPropertyService,
    pub datastreams: DatastreamService,
    pub features: FeatureOfInterestService,
    pub observations: ObservationService,
    config: CoreConfig,
}

/// Run `$body` with `$svc` bound to the service for `$kind`.
macro_rules! with_service {
    ($registry:expr, $kind:expr, |$svc:ident| $body:expr) => {
        match $kind {
            EntityKind::Thing => {
                let $svc = &$registry.things;
                $body
            }
            EntityKind::Location => {
                let $svc = &$registry.locations;
                $body
            }
            EntityKind::HistoricalLocation => {
                let $svc = &$registry.historical_locations;
                $body
            }
            EntityKind::Sensor => {
                let $svc = &$registry.sensors;
                $body
            }
            EntityKind::ObservedProperty => {
                let $svc = &$registry.observed_properties;
                $body
            }
            EntityKind::Datastream => {
                let $svc = &$registry.datastreams;
                $body
            }
            EntityKind::FeatureOfInterest => {
                let $svc = &$registry.features;
                $body
            }
            EntityKind::Observation => {
                let $svc = &$registry.observations;
                $body
            }
            other @ (EntityKind::Dataset | EntityKind::UnitOfMeasurement | EntityKind::Format) => {
                Err(StaError::unsupported(format!("{} is not an entity set", other)))
            }
        }
    };
}

fn decode<S: EntityService>(_svc: &S, body: Value) -> StaResult<S::Payload> {
    serde_json::from_value(body).map_err(|e| {
        StaError::invalid(format!("malformed {} payload: {}", S::Entity::KIND, e))
    })
}

fn page_ids<S: EntityService>(svc: &S, tables: &Tables, plan: &QueryPlan) -> QueryResult {
    let page = svc.query(tables, plan);
    QueryResult {
        ids: page.items.iter().map(|row| row.id().clone()).collect(),
        total: page.total,
        has_more: page.has_more,
    }
}

impl ServiceRegistry {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Start an operation over `tx`.
    pub fn context<'a>(&'a self, tx: Transaction<'a>, now: DateTime<Utc>) -> Context<'a> {
        Context::new(tx, self, now)
    }

    /// Compile query options for one entity set. `scope` narrows the set,
    /// e.g. to the Datastreams of one Thing.
    pub fn compile(
        &self,
        kind: EntityKind,
        options: &QueryOptions,
        scope: Option<Predicate>,
        now: DateTime<Utc>,
    ) -> StaResult<QueryPlan> {
        let root = schema::property_map(kind)
            .ok_or_else(|| StaError::unsupported(format!("{} is not queryable", kind)))?;
        let evaluator = FilterEvaluator::new(self, root, now);
        Ok(QueryCompiler::new(evaluator, self.config.paging()).compile(options, scope)?)
    }

    pub fn query(&self, tables: &Tables, kind: EntityKind, plan: &QueryPlan) -> StaResult<QueryResult> {
        with_service!(self, kind, |svc| Ok(page_ids(svc, tables, plan)))
    }

    /// Create an entity graph from its JSON payload.
    pub fn create(&self, ctx: &mut Context<'_>, kind: EntityKind, body: Value) -> StaResult<EntityId> {
        with_service!(self, kind, |svc| {
            let payload = decode(svc, body)?;
            let id = svc.create(ctx, payload)?;
            debug!(entity = %kind, id = %id, rows = ctx.tx.changes().len(), "Create finished");
            Ok(id)
        })
    }

    pub fn merge(
        &self,
        ctx: &mut Context<'_>,
        kind: EntityKind,
        id: &EntityId,
        body: Value,
    ) -> StaResult<()> {
        with_service!(self, kind, |svc| {
            let patch = decode(svc, body)?;
            svc.merge(ctx, id, patch)
        })
    }

    pub fn replace(
        &self,
        ctx: &mut Context<'_>,
        kind: EntityKind,
        id: &EntityId,
        body: Value,
    ) -> StaResult<()> {
        with_service!(self, kind, |svc| {
            svc.get(ctx.tx.tables(), id)?;
            let payload = decode(svc, body)?;
            svc.replace(ctx, id, payload)
        })
    }

    pub fn delete(&self, ctx: &mut Context<'_>, kind: EntityKind, id: &EntityId) -> StaResult<()> {
        with_service!(self, kind, |svc| svc.delete(ctx, id))
    }
}

impl SchemaRegistry for ServiceRegistry {
    fn property_map(&self, entity: &str) -> Option<&'static PropertyMap> {
        ModelSchema.property_map(entity)
    }
}
