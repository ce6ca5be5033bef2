//! Place handlers, nested under cities for listing and creation

use super::{created, find, find_referenced, json_object, persist, render_all, require, ApiResult};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hbnb_core::{City, Entity, Kind, Model, Place, User};
use serde_json::Value;
use tracing::info;

/// Places whose `city_id` is the city in the path
pub async fn list(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let parent: Entity = find::<City>(&*state.storage, &city_id)?.into();
    render_all(state.relations.children(&parent, Kind::Place))
}

pub async fn create(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    find::<City>(&*state.storage, &city_id)?;
    let attrs = json_object(&headers, &body)?;
    require(&attrs, Place::REQUIRED)?;
    find_referenced::<User>(&*state.storage, &attrs, "user_id")?;

    let entity: Entity = Place::build(&attrs, &[("city_id", &city_id)])?.into();
    persist(&state, entity.clone()).await?;
    info!("Created {} in City.{}", entity.key(), city_id);
    created(&entity)
}
