use crate::*;
use serde_json::{json, Value};
use store::{MemoryTableStore, StoreLimits};

/// An assessment document; each control adds roughly 200 serialized bytes.
pub fn assessment_metrics(controls: usize) -> Value {
    json!({
        "score": {"overall": 73, "license": 64, "secureScore": 58.5},
        "tenant": {"displayName": "Contoso Ltd", "id": "tenant-0001"},
        "licenseInfo": {
            "skus": [
                {"skuPartNumber": "ENTERPRISEPACK", "total": 250, "assigned": 231},
                {"skuPartNumber": "EMS", "total": 100, "assigned": 12},
            ],
        },
        "controls": (0..controls)
            .map(|i| json!({
                "id": format!("ctrl-{:04}", i),
                "score": i % 10,
                "maxScore": 10,
                "description": "Require multi-factor authentication for administrative roles. ".repeat(2),
            }))
            .collect::<Vec<_>>(),
    })
}

/// A JSON array of strings whose compact serialization is exactly `total`
/// bytes (`total >= 4`).
pub fn array_of_size(total: usize) -> Value {
    let n = (total / 1000).max(1);
    let mut remaining = total - 1 - 3 * n;
    let mut items = Vec::with_capacity(n);
    for i in 0..n {
        let len = if i + 1 == n { remaining } else { remaining.min(997) };
        remaining -= len;
        items.push(Value::String("r".repeat(len)));
    }
    Value::Array(items)
}

pub fn codec(config: CodecConfig) -> RecordCodec {
    RecordCodec::new(config, RecordSchema::assessment()).unwrap()
}

pub fn memory_store(config: CodecConfig, limits: StoreLimits) -> ChunkedStore<MemoryTableStore> {
    ChunkedStore::assessments(MemoryTableStore::new(limits), config).unwrap()
}

pub fn assessment_record(metrics: Value) -> Record {
    Record::new("tenant-0001", "assessment-2024-05-01")
        .with("status", json!("completed"))
        .with("score", json!(73))
        .with("metrics", metrics)
}

/// A gateway that rejects every write, counting the attempts.
#[derive(Debug, Default)]
pub struct RejectingGateway {
    pub calls: usize,
    /// Reject with a size-limit error (HTTP 413) or a generic server error.
    pub too_large: bool,
}

impl RejectingGateway {
    pub fn too_large() -> Self {
        Self {
            calls: 0,
            too_large: true,
        }
    }

    pub fn server_error() -> Self {
        Self {
            calls: 0,
            too_large: false,
        }
    }

    fn reject(&mut self) -> Result<(), StoreError> {
        self.calls += 1;
        if self.too_large {
            Err(StoreError::Backend {
                status: Some(413),
                code: Some("RequestBodyTooLarge".to_string()),
                message: "The request body is too large".to_string(),
            })
        } else {
            Err(StoreError::Backend {
                status: Some(500),
                code: Some("InternalError".to_string()),
                message: "Server busy".to_string(),
            })
        }
    }
}

impl StorageGateway for RejectingGateway {
    fn create(&mut self, _entity: StorageEntity) -> Result<(), StoreError> {
        self.reject()
    }

    fn replace(&mut self, _entity: StorageEntity) -> Result<(), StoreError> {
        self.reject()
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<StorageEntity, StoreError> {
        Err(StoreError::not_found(partition_key, row_key))
    }

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        Err(StoreError::not_found(partition_key, row_key))
    }
}
