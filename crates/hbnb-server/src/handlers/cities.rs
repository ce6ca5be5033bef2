//! City handlers, nested under states for listing and creation

use super::{created, find, json_object, persist, render_all, require, ApiResult};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hbnb_core::{City, Entity, Kind, Model, State as StateRecord};
use serde_json::Value;
use tracing::info;

pub async fn list(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let parent: Entity = find::<StateRecord>(&*state.storage, &state_id)?.into();
    render_all(state.relations.children(&parent, Kind::City))
}

pub async fn create(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    find::<StateRecord>(&*state.storage, &state_id)?;
    let attrs = json_object(&headers, &body)?;
    require(&attrs, City::REQUIRED)?;

    let entity: Entity = City::build(&attrs, &[("state_id", &state_id)])?.into();
    persist(&state, entity.clone()).await?;
    info!("Created {} in State.{}", entity.key(), state_id);
    created(&entity)
}
