//! User handlers
//!
//! Passwords are hashed before they reach storage, on create and on update.

use super::{created, find, json_object, persist, render, require, ApiError, ApiResult};
use crate::services::password::hash_password;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hbnb_core::{Entity, Model, User};
use serde_json::Value;
use tracing::info;

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let attrs = json_object(&headers, &body)?;
    require(&attrs, User::REQUIRED)?;

    let mut user = User::build(&attrs, &[])?;
    user.password = hash_password(&user.password).map_err(ApiError::internal)?;

    let entity: Entity = user.into();
    persist(&state, entity.clone()).await?;
    info!("Created {}", entity.key());
    created(&entity)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut user = find::<User>(&*state.storage, &id)?;
    let attrs = json_object(&headers, &body)?;
    user.update(&attrs)?;
    if attrs.contains_key("password") {
        user.password = hash_password(&user.password).map_err(ApiError::internal)?;
    }

    let entity: Entity = user.into();
    persist(&state, entity.clone()).await?;
    Ok(Json(render(&entity)?))
}
