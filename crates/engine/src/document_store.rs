/// A backend that stores whole JSON documents with no property ceiling.
///
/// Fields are kept as given and never chunked, compressed or degraded. It
/// exists alongside [`ChunkedStore`](crate::ChunkedStore) to show the codec
/// is only applied where a store actually needs it.
use chunker::size_of;
use std::collections::BTreeMap;
use store::StoreError;

use crate::codec::FieldReport;
use crate::record::parse_field;
use crate::{AssessmentStore, DecodedRecord, Document, Record, WriteError, WriteReport};

#[derive(Debug, Default)]
pub struct DocumentStore {
    records: BTreeMap<(String, String), BTreeMap<String, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(partition_key: &str, row_key: &str) -> (String, String) {
        (partition_key.to_string(), row_key.to_string())
    }

    fn report(record: &Record) -> WriteReport {
        let fields: Vec<FieldReport> = record
            .fields
            .iter()
            .map(|(name, doc)| {
                let size = size_of(&doc.serialize());
                FieldReport {
                    name: name.clone(),
                    serialized_bytes: size,
                    stored_bytes: size,
                    compressed: false,
                    parts: 1,
                    chunked: false,
                    degraded: false,
                }
            })
            .collect();
        WriteReport {
            entity_bytes: fields.iter().map(|f| f.stored_bytes + f.name.len()).sum(),
            property_count: fields.len(),
            fields,
            degraded: false,
            round_trips: 1,
        }
    }
}

impl AssessmentStore for DocumentStore {
    fn create(&mut self, record: &Record) -> Result<WriteReport, WriteError> {
        let key = Self::key(&record.partition_key, &record.row_key);
        if self.records.contains_key(&key) {
            return Err(StoreError::duplicate(&key.0, &key.1).into());
        }
        self.records.insert(key, record.fields.clone());
        Ok(Self::report(record))
    }

    fn replace(&mut self, record: &Record) -> Result<WriteReport, WriteError> {
        let key = Self::key(&record.partition_key, &record.row_key);
        match self.records.get_mut(&key) {
            Some(fields) => {
                *fields = record.fields.clone();
                Ok(Self::report(record))
            }
            None => Err(StoreError::not_found(&key.0, &key.1).into()),
        }
    }

    fn read(&self, partition_key: &str, row_key: &str) -> Result<DecodedRecord, StoreError> {
        let fields = self
            .records
            .get(&Self::key(partition_key, row_key))
            .ok_or_else(|| StoreError::not_found(partition_key, row_key))?;

        let mut record = DecodedRecord {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
            ..Default::default()
        };
        for (name, doc) in fields {
            let value = match doc {
                Document::Json(v) => v.clone(),
                Document::Text(text) => {
                    let (v, issue) = parse_field(name, text);
                    record.issues.extend(issue);
                    v
                }
            };
            record.fields.insert(name.clone(), value);
        }
        Ok(record)
    }

    fn delete(&mut self, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        self.records
            .remove(&Self::key(partition_key, row_key))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(partition_key, row_key))
    }
}
