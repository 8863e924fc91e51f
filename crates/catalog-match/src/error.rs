use catalog_core::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid crawl record: {0}")]
    InvalidRecord(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;
