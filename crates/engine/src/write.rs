/// Write path: create, replace, and the degrade-and-retry policy.
///
/// Every write encodes the record from scratch, so the entity sent to the
/// store always carries the complete set of chunk properties. When the store
/// answers with a size-limit error the oversized fields are swapped for
/// degraded summaries and the write is retried once. There is no loop and no
/// backoff: at most two round trips per call.
use log::{info, warn};
use store::{StorageEntity, StorageGateway, StoreError};

use crate::codec::{EncodedRecord, FieldReport};
use crate::{ChunkedStore, Record, WriteError};

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// One entry per chunk-eligible field, in name order.
    pub fields: Vec<FieldReport>,
    /// `true` if the store only accepted the degraded form.
    pub degraded: bool,
    /// Store calls made: 1, or 2 after a size-limit rejection.
    pub round_trips: u8,
    /// Approximate size of the entity that was stored.
    pub entity_bytes: usize,
    pub property_count: usize,
}

impl WriteReport {
    fn new(encoded: &EncodedRecord, entity: &StorageEntity, round_trips: u8) -> Self {
        let fields: Vec<FieldReport> = encoded.reports.values().cloned().collect();
        Self {
            degraded: fields.iter().any(|f| f.degraded),
            fields,
            round_trips,
            entity_bytes: entity.approx_size(),
            property_count: entity.property_count(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldReport> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Create,
    Replace,
}

impl<G: StorageGateway> ChunkedStore<G> {
    fn send(&mut self, mode: WriteMode, entity: StorageEntity) -> Result<(), StoreError> {
        match mode {
            WriteMode::Create => self.gateway.create(entity),
            WriteMode::Replace => self.gateway.replace(entity),
        }
    }

    pub(crate) fn write(&mut self, record: &Record, mode: WriteMode) -> Result<WriteReport, WriteError> {
        let encoded = self.codec.encode(record);
        let entity = encoded.to_entity();
        let original_size = entity.approx_size();

        match self.send(mode, entity.clone()) {
            Ok(()) => return Ok(WriteReport::new(&encoded, &entity, 1)),
            Err(e) if e.is_size_limit() => {
                warn!(
                    "{}/{}: store rejected {} bytes ({}), degrading and retrying once",
                    record.partition_key, record.row_key, original_size, e
                );
            }
            Err(e) => return Err(e.into()),
        }

        let degraded = self.codec.degrade(record, &encoded);
        let degraded_entity = degraded.to_entity();
        let degraded_size = degraded_entity.approx_size();

        match self.send(mode, degraded_entity.clone()) {
            Ok(()) => {
                info!(
                    "{}/{}: stored degraded record ({} -> {} bytes)",
                    record.partition_key, record.row_key, original_size, degraded_size
                );
                Ok(WriteReport::new(&degraded, &degraded_entity, 2))
            }
            Err(e) if e.is_size_limit() => Err(WriteError::SizeLimitExceeded {
                original_size,
                degraded_size,
                source: e,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
