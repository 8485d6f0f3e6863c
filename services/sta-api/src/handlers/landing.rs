//! Service root document listing the entity sets.

use axum::{extract::Extension, Json};
use serde::Serialize;
use sta_model::EntityKind;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntitySet {
    pub name: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct Landing {
    pub value: Vec<EntitySet>,
}

/// GET /v1.1 - Entity sets served by this endpoint
pub async fn landing_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Landing> {
    let value = EntityKind::ALL
        .iter()
        .filter_map(|kind| kind.collection())
        .map(|name| EntitySet {
            name,
            url: format!("{}/{}", state.config.base_url, name),
        })
        .collect();
    Json(Landing { value })
}
