//! Amenity handlers

use super::{created, json_object, persist, require, ApiResult};
use crate::AppState;
use axum::{body::Bytes, extract::State, http::{HeaderMap, StatusCode}, Json};
use hbnb_core::{Amenity, Entity, Model};
use serde_json::Value;
use tracing::info;

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let attrs = json_object(&headers, &body)?;
    require(&attrs, Amenity::REQUIRED)?;

    let entity: Entity = Amenity::build(&attrs, &[])?.into();
    persist(&state, entity.clone()).await?;
    info!("Created {}", entity.key());
    created(&entity)
}
