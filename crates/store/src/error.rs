/// Store errors and the generic size-limit classifier.
///
/// Stores signal "too large" in different ways: a dedicated error, an HTTP
/// 413, a service error code, or only a message. [`StoreError::is_size_limit`]
/// folds all of them into one answer so the degrade-and-retry path never
/// needs to know which store it is talking to.
use std::io;
use thiserror::Error;

/// Service error codes that mean a property or entity was too large.
pub const SIZE_LIMIT_CODES: &[&str] = &[
    "PropertyValueTooLarge",
    "EntityTooLarge",
    "RequestBodyTooLarge",
    "RequestEntityTooLarge",
    "TooManyProperties",
];

/// Message fragments (lower-case) that mean a property or entity was too large.
const SIZE_LIMIT_PHRASES: &[&str] = &["too large", "exceeds the maximum", "request body is too large"];

/// Errors returned by a [`StorageGateway`](crate::StorageGateway).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A property or the whole entity exceeded a store limit.
    #[error("{code}: {message}")]
    SizeLimit { code: &'static str, message: String },

    #[error("entity not found: {partition_key}/{row_key}")]
    NotFound {
        partition_key: String,
        row_key: String,
    },

    #[error("entity already exists: {partition_key}/{row_key}")]
    DuplicateKey {
        partition_key: String,
        row_key: String,
    },

    /// An error reported by a remote store, kept in its raw form.
    #[error("store error (status {status:?}, code {code:?}): {message}")]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Stored bytes failed their checksum or could not be decoded.
    #[error("corrupt entity: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(partition_key: &str, row_key: &str) -> Self {
        StoreError::NotFound {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
        }
    }

    pub fn duplicate(partition_key: &str, row_key: &str) -> Self {
        StoreError::DuplicateKey {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
        }
    }

    /// `true` if the store rejected a write because something was too large.
    pub fn is_size_limit(&self) -> bool {
        match self {
            StoreError::SizeLimit { .. } => true,
            StoreError::Backend {
                status,
                code,
                message,
            } => {
                if *status == Some(413) {
                    return true;
                }
                if let Some(code) = code {
                    if SIZE_LIMIT_CODES.iter().any(|c| c.eq_ignore_ascii_case(code)) {
                        return true;
                    }
                }
                let message = message.to_ascii_lowercase();
                SIZE_LIMIT_PHRASES.iter().any(|p| message.contains(p))
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}
