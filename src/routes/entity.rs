//! Entity CRUD routes built from the catalog.
//! Uses parameterized paths so Path extractors receive the segment and id; handlers resolve the entity by path.

use crate::handlers::entity::{create, create_nested, delete as delete_handler, list, list_nested, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(list).post(create))
        .route(
            "/:path_segment/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .route("/:path_segment/:id/:child", get(list_nested).post(create_nested))
        .with_state(state)
}
