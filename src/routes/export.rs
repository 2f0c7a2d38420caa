//! Export routes: ZIP dossiers for cats and litters.

use crate::handlers::export::{export_cat, export_litter};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn export_routes(state: AppState) -> Router {
    Router::new()
        .route("/exports/cats/:id", get(export_cat))
        .route("/exports/litters/:id", get(export_litter))
        .with_state(state)
}
