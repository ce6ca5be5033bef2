//! HBnB API server
//!
//! REST CRUD over states, cities, amenities, users, places and reviews,
//! backed by either a JSON file or an embedded SQLite database.

pub mod config;
pub mod handlers;
pub mod services;
pub mod storage;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use handlers::resource;
use hbnb_core::{Amenity, City, Place, Review, State as StateRecord, Storage, User};
use services::RelationResolver;
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub relations: Arc<RelationResolver>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let relations = Arc::new(RelationResolver::new(storage.clone()));
        Self { storage, relations }
    }
}

/// Build the full service: API under `/api/v1`, JSON 404 everywhere else.
///
/// Trailing slashes are trimmed before routing, so `/api/v1/states/` and
/// `/api/v1/states` reach the same handler.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), teardown))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/stats", get(handlers::stats))
        .route(
            "/states",
            get(resource::list::<StateRecord>).post(handlers::states::create),
        )
        .route(
            "/states/:id",
            get(resource::show::<StateRecord>)
                .put(resource::update::<StateRecord>)
                .delete(resource::destroy::<StateRecord>),
        )
        .route(
            "/states/:id/cities",
            get(handlers::cities::list).post(handlers::cities::create),
        )
        .route(
            "/cities/:id",
            get(resource::show::<City>)
                .put(resource::update::<City>)
                .delete(resource::destroy::<City>),
        )
        .route(
            "/cities/:id/places",
            get(handlers::places::list).post(handlers::places::create),
        )
        .route(
            "/amenities",
            get(resource::list::<Amenity>).post(handlers::amenities::create),
        )
        .route(
            "/amenities/:id",
            get(resource::show::<Amenity>)
                .put(resource::update::<Amenity>)
                .delete(resource::destroy::<Amenity>),
        )
        .route(
            "/users",
            get(resource::list::<User>).post(handlers::users::create),
        )
        .route(
            "/users/:id",
            get(resource::show::<User>)
                .put(handlers::users::update)
                .delete(resource::destroy::<User>),
        )
        .route(
            "/places/:id",
            get(resource::show::<Place>)
                .put(resource::update::<Place>)
                .delete(resource::destroy::<Place>),
        )
        .route(
            "/places/:id/reviews",
            get(handlers::reviews::list).post(handlers::reviews::create),
        )
        .route(
            "/reviews/:id",
            get(resource::show::<Review>)
                .put(resource::update::<Review>)
                .delete(resource::destroy::<Review>),
        )
}

/// Release the storage session once the response is ready.
async fn teardown(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if let Err(e) = state.storage.close().await {
        warn!("Failed to close {} storage: {}", state.storage.name(), e);
    }
    response
}
