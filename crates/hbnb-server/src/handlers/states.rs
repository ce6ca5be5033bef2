//! State handlers

use super::{created, json_object, persist, require, ApiResult};
use crate::AppState;
use axum::{body::Bytes, extract::State, http::{HeaderMap, StatusCode}, Json};
use hbnb_core::{Entity, Model, State as StateRecord};
use serde_json::Value;
use tracing::info;

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let attrs = json_object(&headers, &body)?;
    require(&attrs, StateRecord::REQUIRED)?;

    let entity: Entity = StateRecord::build(&attrs, &[])?.into();
    persist(&state, entity.clone()).await?;
    info!("Created {}", entity.key());
    created(&entity)
}
