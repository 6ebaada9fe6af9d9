//! Local art catalog: image blobs on disk indexed by a SQLite store with a
//! denormalized tag cache, plus background save and bulk-import workflows.

pub mod catalog;
pub mod database;
pub mod error;
pub mod ingest;
pub mod media;
pub mod search;
pub mod storage;
pub mod utils;
pub mod workflow;

pub use catalog::Catalog;
pub use database::models::Artwork;
pub use error::{CatalogError, Result};
pub use utils::config::CatalogConfig;
pub use workflow::{
    ImportReport, JobEvent, JobHandle, Progress, RenameChoice, SaveDecision, SaveIntent, SaveRequest,
    SavedArtwork, Selection,
};
