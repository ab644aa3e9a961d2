/// In-memory table store.
///
/// Entities live in a `BTreeMap` keyed by `(partition_key, row_key)`. Every
/// create/replace is checked against [`StoreLimits`] before it is applied, so
/// a rejected write leaves the map untouched.
use config::StoreLimits;
use log::debug;
use std::collections::BTreeMap;

use crate::{enforce, StorageEntity, StorageGateway, StoreError};

#[derive(Debug, Default)]
pub struct MemoryTableStore {
    entities: BTreeMap<(String, String), StorageEntity>,
    limits: StoreLimits,
    /// Create/replace calls received, accepted or not.
    write_attempts: usize,
}

impl MemoryTableStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            entities: BTreeMap::new(),
            limits,
            write_attempts: 0,
        }
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Direct access to a stored entity, bypassing the gateway.
    pub fn get(&self, partition_key: &str, row_key: &str) -> Option<&StorageEntity> {
        self.entities
            .get(&(partition_key.to_string(), row_key.to_string()))
    }

    /// Mutable access for tests that simulate partial writes or corruption.
    pub fn get_mut(&mut self, partition_key: &str, row_key: &str) -> Option<&mut StorageEntity> {
        self.entities
            .get_mut(&(partition_key.to_string(), row_key.to_string()))
    }
}

impl StorageGateway for MemoryTableStore {
    fn create(&mut self, entity: StorageEntity) -> Result<(), StoreError> {
        self.write_attempts += 1;
        enforce(&self.limits, &entity)?;

        let key = (entity.partition_key.clone(), entity.row_key.clone());
        if self.entities.contains_key(&key) {
            return Err(StoreError::duplicate(&key.0, &key.1));
        }
        debug!(
            "memory store: create {}/{} ({} properties, {} bytes)",
            key.0,
            key.1,
            entity.property_count(),
            entity.approx_size()
        );
        self.entities.insert(key, entity);
        Ok(())
    }

    fn replace(&mut self, entity: StorageEntity) -> Result<(), StoreError> {
        self.write_attempts += 1;
        enforce(&self.limits, &entity)?;

        let key = (entity.partition_key.clone(), entity.row_key.clone());
        match self.entities.get_mut(&key) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(StoreError::not_found(&key.0, &key.1)),
        }
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<StorageEntity, StoreError> {
        self.get(partition_key, row_key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(partition_key, row_key))
    }

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        self.entities
            .remove(&(partition_key.to_string(), row_key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(partition_key, row_key))
    }
}
