use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("An artwork named '{0}' already exists")]
    DuplicateName(String),

    #[error("An artwork already uses the file {0}")]
    DuplicatePath(String),

    #[error("Tag '{0}' already exists")]
    DuplicateTag(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Artwork name must not be empty")]
    EmptyName,

    #[error("Invalid tag '{0}': tags may not contain ','")]
    InvalidTag(String),

    #[error("IO failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{operation} failed: {source}")]
    OperationFailed {
        operation: &'static str,
        #[source]
        source: Box<CatalogError>,
    },

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn artwork_not_found(id: i64) -> Self {
        CatalogError::NotFound(format!("artwork {}", id))
    }

    pub fn tag_not_found(name: &str) -> Self {
        CatalogError::NotFound(format!("tag '{}'", name))
    }

    /// Wraps a background failure so callers can tell it apart from success.
    /// An error that is already wrapped is passed through as is.
    pub fn failed(operation: &'static str, source: CatalogError) -> Self {
        match source {
            wrapped @ CatalogError::OperationFailed { .. } => wrapped,
            other => CatalogError::OperationFailed {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error beneath any `OperationFailed` layers.
    pub fn root_cause(&self) -> &CatalogError {
        match self {
            CatalogError::OperationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
