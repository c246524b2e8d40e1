//! Record store error types

use thiserror::Error;

/// Failures reported by a [`RecordStore`](crate::link::RecordStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// The collection or table does not exist; link providers treat this as a miss
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result alias for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
