//! Handlers shared by every resource family: list, show, update, delete

use super::{find, json_object, remove, persist, render, render_all, ApiResult};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use hbnb_core::{Entity, Model};
use serde_json::{json, Value};
use tracing::info;

pub async fn list<T: Model>(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    render_all(state.storage.all(Some(T::KIND)))
}

pub async fn show<T: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = find::<T>(&*state.storage, &id)?;
    Ok(Json(render(&record.into())?))
}

pub async fn update<T: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut record = find::<T>(&*state.storage, &id)?;
    let attrs = json_object(&headers, &body)?;
    record.update(&attrs)?;

    let entity: Entity = record.into();
    persist(&state, entity.clone()).await?;
    Ok(Json(render(&entity)?))
}

pub async fn destroy<T: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let entity: Entity = find::<T>(&*state.storage, &id)?.into();
    remove(&state, &entity).await?;
    info!("Deleted {}", entity.key());
    Ok(Json(json!({})))
}
