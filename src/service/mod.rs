//! CrudService: generic CRUD over the gateway using the safe SQL builder.

mod crud;
pub use crud::CrudService;
