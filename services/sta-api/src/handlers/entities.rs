//! Entity-set handlers: collection reads, navigation, create, patch,
//! replace and delete.

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use sta_common::{EntityId, StaError, StaResult};
use sta_core::navigation;
use sta_filter::{Predicate, QueryOptions};
use sta_model::EntityKind;
use std::collections::HashMap;
use std::sync::Arc;
use storage::Tables;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_read, record_write, WriteOp};
use crate::query::parse_options;
use crate::representation::{render, select, self_link};
use crate::resource::{self, Resource};
use crate::state::AppState;

type Params = HashMap<String, String>;

fn parse_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

/// Link to the next page, repeating the request's own options.
fn next_link(state: &AppState, path: &str, params: &Params, skip: usize, top: usize) -> String {
    let mut query: Vec<String> = params
        .iter()
        .filter(|(key, _)| key.as_str() != "$top" && key.as_str() != "$skip")
        .map(|(key, value)| format!("{}={}", key, value.replace(' ', "%20")))
        .collect();
    query.sort();
    query.push(format!("$top={}", top));
    query.push(format!("$skip={}", skip));
    format!("{}/{}?{}", state.config.base_url, path, query.join("&"))
}

fn render_one(state: &AppState, tables: &Tables, kind: EntityKind, id: &EntityId, options: &QueryOptions) -> StaResult<Value> {
    let entity = render(tables, &state.config.base_url, kind, id)?;
    Ok(match &options.select {
        Some(properties) => select(entity, properties),
        None => entity,
    })
}

fn list(
    state: &AppState,
    tables: &Tables,
    kind: EntityKind,
    scope: Option<Predicate>,
    options: &QueryOptions,
    path: &str,
    params: &Params,
) -> StaResult<Value> {
    let plan = state.services.compile(kind, options, scope, Utc::now())?;
    let page = state.services.query(tables, kind, &plan)?;

    let value = page
        .ids
        .iter()
        .map(|id| render_one(state, tables, kind, id, options))
        .collect::<StaResult<Vec<Value>>>()?;

    let mut body = Map::new();
    if let Some(total) = page.total {
        body.insert("@iot.count".to_string(), json!(total));
    }
    if page.has_more {
        let link = next_link(state, path, params, plan.offset + page.ids.len(), plan.limit);
        body.insert("@iot.nextLink".to_string(), Value::String(link));
    }
    body.insert("value".to_string(), Value::Array(value));
    Ok(Value::Object(body))
}

/// GET on any resource path.
pub async fn get_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Value>> {
    let resource = resource::parse(&path)?;
    let options = parse_options(&params)?;

    let body = state
        .read(|tables| match resource {
            Resource::Collection(kind) => {
                record_read(kind);
                list(&state, tables, kind, None, &options, &path, &params)
            }
            Resource::Entity(kind, id) => {
                record_read(kind);
                render_one(&state, tables, kind, &id, &options)
            }
            Resource::Related {
                parent,
                parent_id,
                child,
                single,
            } => {
                record_read(child);
                let scope = navigation::scope(tables, parent, &parent_id, child)?;
                if !single {
                    return list(&state, tables, child, Some(scope), &options, &path, &params);
                }
                let plan = state.services.compile(
                    child,
                    &QueryOptions::default(),
                    Some(scope),
                    Utc::now(),
                )?;
                let page = state.services.query(tables, child, &plan)?;
                let id = page.ids.first().ok_or_else(|| {
                    StaError::not_found(child.name(), format!("{}({})/{}", parent, parent_id, child))
                })?;
                render_one(&state, tables, child, id, &options)
            }
        })
        .await?;
    Ok(Json(body))
}

/// Thread the parent of a navigation path into a create body.
fn link_parent(
    body: &mut Value,
    parent: EntityKind,
    parent_id: &EntityId,
    child: EntityKind,
) -> StaResult<()> {
    use EntityKind as K;

    let object = body
        .as_object_mut()
        .ok_or_else(|| StaError::invalid("request body must be a JSON object"))?;
    let reference = json!({ "@iot.id": parent_id.as_str() });
    match (parent, child) {
        (K::Thing, K::Datastream)
        | (K::Thing, K::HistoricalLocation)
        | (K::Sensor, K::Datastream)
        | (K::ObservedProperty, K::Datastream)
        | (K::Datastream, K::Observation)
        | (K::FeatureOfInterest, K::Observation) => {
            object.insert(parent.name().to_string(), reference);
        }
        (K::Thing, K::Location) => {
            object.insert("Things".to_string(), json!([reference]));
        }
        (K::Location, K::Thing) => {
            object.insert("Locations".to_string(), json!([reference]));
        }
        _ => {
            return Err(StaError::invalid(format!(
                "cannot create {} through {}",
                child, parent
            )))
        }
    }
    Ok(())
}

fn created(state: &AppState, tables: &Tables, kind: EntityKind, id: &EntityId) -> StaResult<Response> {
    let entity = render(tables, &state.config.base_url, kind, id)?;
    let location = self_link(&state.config.base_url, kind, id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(entity),
    )
        .into_response())
}

/// POST to a collection, or to a navigation collection such as
/// `Datastreams(1)/Observations`.
pub async fn post_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let mut body = parse_body(&body)?;
    let kind = match resource::parse(&path)? {
        Resource::Collection(kind) => kind,
        Resource::Related {
            parent,
            parent_id,
            child,
            single: false,
        } => {
            link_parent(&mut body, parent, &parent_id, child)?;
            child
        }
        _ => return Err(StaError::invalid("POST must target an entity collection").into()),
    };

    let id = state
        .write(move |services, ctx| services.create(ctx, kind, body))
        .await?;
    record_write(kind, WriteOp::Create);
    info!(entity = %kind, id = %id, "Created entity");

    Ok(state.read(|tables| created(&state, tables, kind, &id)).await?)
}

fn single_entity(path: &str) -> ApiResult<(EntityKind, EntityId)> {
    match resource::parse(path)? {
        Resource::Entity(kind, id) => Ok((kind, id)),
        _ => Err(StaError::invalid("this method must target a single entity").into()),
    }
}

/// PATCH a single entity.
pub async fn patch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let (kind, id) = single_entity(&path)?;
    let patch = parse_body(&body)?;

    let target = id.clone();
    state
        .write(move |services, ctx| services.merge(ctx, kind, &target, patch))
        .await?;
    record_write(kind, WriteOp::Update);

    let entity = state
        .read(|tables| render(tables, &state.config.base_url, kind, &id))
        .await?;
    Ok(Json(entity))
}

/// PUT a single entity. Whole-resource replacement is not supported, so
/// this answers 404 or 501.
pub async fn put_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let (kind, id) = single_entity(&path)?;
    let payload = parse_body(&body)?;
    state
        .write(move |services, ctx| services.replace(ctx, kind, &id, payload))
        .await?;
    record_write(kind, WriteOp::Update);
    Ok(StatusCode::OK)
}

/// DELETE a single entity and everything depending on it.
pub async fn delete_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
) -> ApiResult<StatusCode> {
    let (kind, id) = single_entity(&path)?;
    state
        .write(move |services, ctx| services.delete(ctx, kind, &id))
        .await?;
    record_write(kind, WriteOp::Delete);
    Ok(StatusCode::OK)
}
