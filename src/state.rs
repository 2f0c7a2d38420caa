//! Shared application state for all routes.

use crate::gateway::Gateway;
use crate::schema::{catalog, Catalog};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub catalog: &'static Catalog,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        AppState {
            gateway,
            catalog: catalog(),
        }
    }
}
