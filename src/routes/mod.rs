mod common;
mod entity;
mod export;

pub use common::common_routes_with_ready;
pub use entity::entity_routes;
pub use export::export_routes;
