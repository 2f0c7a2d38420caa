//! ChatterieSync: record-keeping REST backend for a cattery.

pub mod error;
pub mod export;
pub mod gateway;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod transfer;

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::{AppError, ConfigError, SchemaError};
pub use gateway::{Gateway, Scope};
pub use migration::apply_migrations;
pub use routes::{common_routes_with_ready, entity_routes, export_routes};
pub use schema::{catalog, Catalog, EntityKind};
pub use service::CrudService;
pub use settings::Settings;
pub use state::AppState;
pub use transfer::{CreateInput, Patch, Presence};

/// Full HTTP surface: health/ready/version, exports, and every entity collection.
pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(export_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}
