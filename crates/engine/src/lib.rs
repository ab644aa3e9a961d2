//! # Engine - chunked record persistence
//!
//! Stores logical records whose JSON fields may be far larger than a single
//! table-store property allows.
//!
//! ## Architecture
//!
//! ```text
//! Caller (Record)
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                 CHUNKED STORE                 │
//! │                                               │
//! │ write.rs → RecordCodec::encode                │
//! │              size → compress? → split         │
//! │              |                                │
//! │              v                                │
//! │           gateway.create / replace            │
//! │              |                                │
//! │              |  (size-limit error?)           │
//! │              |            yes                 │
//! │              v                                │
//! │           RecordCodec::degrade → retry once   │
//! │                                               │
//! │ read.rs → gateway.read → RecordCodec::decode  │
//! │            (gather parts → reconstruct → parse)│
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module             | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | [`lib.rs`]         | `AssessmentStore` trait, `ChunkedStore` struct   |
//! | [`record`]         | `Record`, `Document`, `RecordSchema`, `DecodedRecord` |
//! | [`codec`]          | `RecordCodec`: encode, degrade, decode           |
//! | [`write`]          | create / replace / upsert with degrade-and-retry |
//! | [`read`]           | `read_record`, `read_entity`                     |
//! | [`document_store`] | `DocumentStore`: backend without a size ceiling  |
//!
//! ## Failure Policy
//!
//! A size-limit rejection is recovered exactly once by degrading the oversized
//! fields and retrying. A second rejection is returned as
//! [`WriteError::SizeLimitExceeded`]. Every other store error passes through.
//! Reads never fail because of a damaged field: the field is returned partial
//! or as a placeholder and the problem is listed in
//! [`DecodedRecord::issues`].
pub mod codec;
mod document_store;
mod error;
mod read;
mod record;
mod write;

pub use codec::{EncodedRecord, FieldReport, RecordCodec, StoredField};
pub use config::{CodecConfig, ConfigError};
pub use document_store::DocumentStore;
pub use error::WriteError;
pub use record::{DecodedRecord, Document, FieldIssue, Record, RecordSchema, PARSE_ERROR_MARKER};
pub use store::{StorageEntity, StorageGateway, StoreError};
pub use write::WriteReport;

use write::WriteMode;

/// Persistence of assessment records, whatever the backend.
pub trait AssessmentStore {
    /// Writes a new record. Fails if one already exists under the same keys.
    fn create(&mut self, record: &Record) -> Result<WriteReport, WriteError>;

    /// Overwrites an existing record wholesale.
    fn replace(&mut self, record: &Record) -> Result<WriteReport, WriteError>;

    /// Creates the record, or replaces it if it already exists.
    fn upsert(&mut self, record: &Record) -> Result<WriteReport, WriteError> {
        match self.create(record) {
            Err(WriteError::Store(e)) if e.is_duplicate() => self.replace(record),
            other => other,
        }
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<DecodedRecord, StoreError>;

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError>;
}

/// A [`StorageGateway`] wrapped with the chunking codec.
///
/// Use it for stores with a per-property ceiling. Backends without one
/// (see [`DocumentStore`]) implement [`AssessmentStore`] directly.
pub struct ChunkedStore<G> {
    pub(crate) gateway: G,
    pub(crate) codec: RecordCodec,
}

impl<G: std::fmt::Debug> std::fmt::Debug for ChunkedStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedStore")
            .field("gateway", &self.gateway)
            .field("config", self.codec.config())
            .field("schema", self.codec.schema())
            .finish()
    }
}

impl<G: StorageGateway> ChunkedStore<G> {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(gateway: G, config: CodecConfig, schema: RecordSchema) -> Result<Self, ConfigError> {
        Ok(Self {
            gateway,
            codec: RecordCodec::new(config, schema)?,
        })
    }

    /// A store for security assessments with the given thresholds.
    pub fn assessments(gateway: G, config: CodecConfig) -> Result<Self, ConfigError> {
        Self::new(gateway, config, RecordSchema::assessment())
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn into_inner(self) -> G {
        self.gateway
    }
}

impl<G: StorageGateway> AssessmentStore for ChunkedStore<G> {
    fn create(&mut self, record: &Record) -> Result<WriteReport, WriteError> {
        self.write(record, WriteMode::Create)
    }

    fn replace(&mut self, record: &Record) -> Result<WriteReport, WriteError> {
        self.write(record, WriteMode::Replace)
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<DecodedRecord, StoreError> {
        self.read_record(partition_key, row_key)
    }

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        self.gateway.delete(partition_key, row_key)
    }
}

#[cfg(test)]
mod tests;
