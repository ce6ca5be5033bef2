//! HTTP handlers

pub mod amenities;
pub mod cities;
pub mod index;
pub mod places;
pub mod resource;
pub mod reviews;
pub mod states;
pub mod users;

pub use index::{not_found, stats, status};

use crate::AppState;
use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hbnb_core::{ports::storage::fetch, Entity, HbnbError, Model, Storage};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use tracing::error;

/// Error response rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Not found".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(e: impl Display) -> Self {
        error!("Request failed: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<HbnbError> for ApiError {
    fn from(e: HbnbError) -> Self {
        Self::internal(e)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Parse a request body that must be a non-empty JSON object sent as JSON.
pub fn json_object(headers: &HeaderMap, body: &Bytes) -> ApiResult<Map<String, Value>> {
    if !is_json_content_type(headers) {
        return Err(ApiError::bad_request("Not a JSON"));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::bad_request("Not a JSON")),
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Check required fields in order; absent and null both count as missing.
pub fn require(attrs: &Map<String, Value>, fields: &[&str]) -> ApiResult<()> {
    for field in fields {
        if attrs.get(*field).map_or(true, Value::is_null) {
            return Err(ApiError::bad_request(format!("Missing {}", field)));
        }
    }
    Ok(())
}

/// Typed lookup that answers 404 on a miss.
pub fn find<T: Model>(storage: &dyn Storage, id: &str) -> ApiResult<T> {
    fetch::<T>(storage, id).ok_or_else(ApiError::not_found)
}

/// Look up the record an attribute points at (e.g. `user_id`), 404 if absent.
pub fn find_referenced<T: Model>(
    storage: &dyn Storage,
    attrs: &Map<String, Value>,
    field: &str,
) -> ApiResult<T> {
    attrs
        .get(field)
        .and_then(Value::as_str)
        .and_then(|id| fetch::<T>(storage, id))
        .ok_or_else(ApiError::not_found)
}

pub fn render(entity: &Entity) -> ApiResult<Value> {
    Ok(entity.to_public_json()?)
}

pub fn render_all(entities: Vec<Entity>) -> ApiResult<Json<Vec<Value>>> {
    let rendered = entities
        .iter()
        .map(render)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(rendered))
}

/// Stage `entity` and commit the index.
pub async fn persist(state: &AppState, entity: Entity) -> ApiResult<()> {
    state.storage.new(entity);
    state.storage.save().await?;
    Ok(())
}

/// Remove `entity` and commit the index.
pub async fn remove(state: &AppState, entity: &Entity) -> ApiResult<()> {
    state.storage.delete(entity);
    state.storage.save().await?;
    Ok(())
}

/// 201 with the rendered entity
pub fn created(entity: &Entity) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(render(entity)?)))
}
