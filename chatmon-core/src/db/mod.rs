//! Database layer: schema and repository.

pub mod repo;
pub mod schema;

pub use repo::Database;
