pub mod models;
pub mod repo;
pub mod schema;
pub mod tag_sync;
