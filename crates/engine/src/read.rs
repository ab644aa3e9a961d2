/// Read path: fetch the entity, then decode it.
///
/// Entities are decoded immediately and never cached. Decoding cannot fail;
/// only the store call can.
use store::{StorageEntity, StorageGateway, StoreError};

use crate::{ChunkedStore, DecodedRecord};

impl<G: StorageGateway> ChunkedStore<G> {
    /// Reads and decodes one record.
    ///
    /// # Errors
    ///
    /// Passes through store errors, [`StoreError::NotFound`] included.
    pub fn read_record(&self, partition_key: &str, row_key: &str) -> Result<DecodedRecord, StoreError> {
        let entity = self.gateway.read(partition_key, row_key)?;
        let record = self.codec.decode(&entity);
        for issue in &record.issues {
            log::debug!("{}/{}: {:?}", partition_key, row_key, issue);
        }
        Ok(record)
    }

    /// The raw entity, without decoding. Useful for inspecting the chunk
    /// layout.
    pub fn read_entity(&self, partition_key: &str, row_key: &str) -> Result<StorageEntity, StoreError> {
        self.gateway.read(partition_key, row_key)
    }
}
