//! Review handlers, nested under places for listing and creation

use super::{created, find, find_referenced, json_object, persist, render_all, require, ApiResult};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hbnb_core::{Entity, Kind, Model, Place, Review, User};
use serde_json::Value;
use tracing::info;

pub async fn list(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let parent: Entity = find::<Place>(&*state.storage, &place_id)?.into();
    render_all(state.relations.children(&parent, Kind::Review))
}

pub async fn create(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    find::<Place>(&*state.storage, &place_id)?;
    let attrs = json_object(&headers, &body)?;
    require(&attrs, Review::REQUIRED)?;
    find_referenced::<User>(&*state.storage, &attrs, "user_id")?;

    let entity: Entity = Review::build(&attrs, &[("place_id", &place_id)])?.into();
    persist(&state, entity.clone()).await?;
    info!("Created {} for Place.{}", entity.key(), place_id);
    created(&entity)
}
