//! HTTP handlers for entity CRUD and exports.

pub mod entity;
pub mod export;
pub use entity::*;
pub use export::*;
