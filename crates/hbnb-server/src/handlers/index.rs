//! Service-level endpoints: status, stats and the JSON 404 fallback

use super::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::Kind;
use serde_json::{json, Map, Value};

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Live count per collection
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let counts: Map<String, Value> = Kind::ALL
        .into_iter()
        .map(|kind| (kind.plural().to_string(), json!(state.storage.count(Some(kind)))))
        .collect();
    Json(Value::Object(counts))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
