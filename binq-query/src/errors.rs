use log::error;
use thiserror::Error;

use binq_binning::BinError;

use crate::codec::DecodeError;

/// Error type for binq-query operations.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No codec for the requested format, or a malformed table descriptor or profile.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The backing store failed while connecting, preparing, binding, executing or fetching.
    #[error("Storage error while {context}: {source}")]
    StorageError {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    InvariantViolation(#[from] BinError),

    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    #[error("Query engine is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for binq-query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Wraps driver errors into [`QueryError::StorageError`] at the point where the
/// store is touched.
pub(crate) trait StorageContext<T> {
    fn storage(self, context: &str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, context: &str) -> Result<T> {
        self.map_err(|source| {
            error!("Error {}: {}", context, source);
            QueryError::StorageError {
                context: context.to_string(),
                source,
            }
        })
    }
}
