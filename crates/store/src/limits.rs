/// Limit enforcement shared by the bundled table stores.
use config::StoreLimits;

use crate::{PropertyValue, StorageEntity, StoreError};

/// Checks `entity` against `limits` the way a table store does on write:
/// each string property, then the property count, then the total size.
///
/// # Errors
///
/// Returns [`StoreError::SizeLimit`] naming the first limit violated, or
/// [`StoreError::InvalidKey`] for an empty partition or row key.
pub fn enforce(limits: &StoreLimits, entity: &StorageEntity) -> Result<(), StoreError> {
    if entity.partition_key.is_empty() || entity.row_key.is_empty() {
        return Err(StoreError::InvalidKey(
            "partition key and row key must not be empty".to_string(),
        ));
    }

    for (name, value) in entity.iter() {
        if let PropertyValue::Str(s) = value {
            if s.len() > limits.max_property_bytes {
                return Err(StoreError::SizeLimit {
                    code: "PropertyValueTooLarge",
                    message: format!(
                        "property '{}' is {} bytes (max {})",
                        name,
                        s.len(),
                        limits.max_property_bytes
                    ),
                });
            }
        }
    }

    let count = entity.property_count();
    if count > limits.max_properties {
        return Err(StoreError::SizeLimit {
            code: "TooManyProperties",
            message: format!("entity has {} properties (max {})", count, limits.max_properties),
        });
    }

    let size = entity.approx_size();
    if size > limits.max_entity_bytes {
        return Err(StoreError::SizeLimit {
            code: "EntityTooLarge",
            message: format!("entity is {} bytes (max {})", size, limits.max_entity_bytes),
        });
    }

    Ok(())
}
