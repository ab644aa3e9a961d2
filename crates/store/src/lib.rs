//! # Store - key-value table store contract
//!
//! The narrow interface the chunking codec depends on, plus two table-store
//! backends that enforce the same per-property and per-entity ceilings a
//! cloud table store does.
//!
//! ```text
//! StorageEntity { partition_key, row_key, properties: name -> PropertyValue }
//!        |
//!        v
//! StorageGateway::create / replace / read / delete
//!        |
//!        +-- MemoryTableStore   (BTreeMap, limits enforced, counts writes)
//!        +-- FileTableStore     (one CRC-framed file per entity, atomic writes)
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | [`entity`]   | `PropertyValue`, `StorageEntity`, size accounting        |
//! | [`error`]    | `StoreError` and the generic size-limit classifier       |
//! | [`limits`]   | `enforce()` of `StoreLimits` against an entity           |
//! | [`memory`]   | `MemoryTableStore`                                       |
//! | [`file`]     | `FileTableStore`                                         |

mod entity;
mod error;
mod file;
mod limits;
mod memory;

pub use config::StoreLimits;
pub use entity::{PropertyValue, StorageEntity};
pub use error::{StoreError, SIZE_LIMIT_CODES};
pub use file::{FileTableStore, MAX_HEX_NAME};
pub use limits::enforce;
pub use memory::MemoryTableStore;

/// The operations a key-value table store offers, addressed by partition key
/// and row key.
///
/// Implementations report an oversized property or entity as an error for
/// which [`StoreError::is_size_limit`] returns `true`; callers rely on that
/// classification rather than on a particular variant.
pub trait StorageGateway {
    /// Inserts a new entity. Fails with [`StoreError::DuplicateKey`] if one
    /// already exists under the same keys.
    fn create(&mut self, entity: StorageEntity) -> Result<(), StoreError>;

    /// Replaces an existing entity wholesale. Fails with
    /// [`StoreError::NotFound`] if there is nothing to replace.
    fn replace(&mut self, entity: StorageEntity) -> Result<(), StoreError>;

    fn read(&self, partition_key: &str, row_key: &str) -> Result<StorageEntity, StoreError>;

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError>;
}
