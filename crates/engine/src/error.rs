use store::StoreError;
use thiserror::Error;

/// Errors surfaced by a record write.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The store rejected both the full record and its degraded form.
    #[error(
        "record too large for the store: {original_size} bytes, still rejected at {degraded_size} bytes after degradation: {source}"
    )]
    SizeLimitExceeded {
        original_size: usize,
        degraded_size: usize,
        source: StoreError,
    },

    /// Any other store failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WriteError {
    /// The underlying store error.
    pub fn store_error(&self) -> &StoreError {
        match self {
            WriteError::SizeLimitExceeded { source, .. } => source,
            WriteError::Store(e) => e,
        }
    }
}
