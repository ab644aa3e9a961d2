/// RecordCodec: logical record <-> flat table-store entity.
///
/// ## Property layout
///
/// For a chunk-eligible field `F`:
///
/// ```text
/// stored whole:   F = "<json>"
/// stored chunked: F_isChunked = true
///                 F_chunkCount = N
///                 F_chunk0 .. F_chunk{N-1} = "<part>"
/// ```
///
/// Inside the codec a chunked field is a [`StoredField::Chunked`] holding its
/// ordered parts; the numbered property names only exist in the
/// [`StorageEntity`] produced by [`EncodedRecord::to_entity`].
///
/// ## Per-field write decision
///
/// 1. Serialize; `size <= max_property_bytes` -> stored whole.
/// 2. `size > compression_threshold`, or the split would exceed
///    `max_chunk_count` parts -> compress first.
/// 3. Split into parts of `min(max_part_bytes, max_property_bytes)` bytes.
///    Still over the ceiling -> written anyway; the store decides.
use chunker::{part_count_for, reconstruct_indexed, size_of, split};
use config::{CodecConfig, ConfigError};
use log::{debug, warn};
use serde_json::{Number, Value};
use shrink::{compress, summarize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use store::{PropertyValue, StorageEntity};

use crate::record::{parse_field, DecodedRecord, Document, FieldIssue, Record, RecordSchema};

pub const IS_CHUNKED_SUFFIX: &str = "_isChunked";
pub const CHUNK_COUNT_SUFFIX: &str = "_chunkCount";
pub const CHUNK_PART_INFIX: &str = "_chunk";

pub fn is_chunked_key(field: &str) -> String {
    format!("{}{}", field, IS_CHUNKED_SUFFIX)
}

pub fn chunk_count_key(field: &str) -> String {
    format!("{}{}", field, CHUNK_COUNT_SUFFIX)
}

pub fn chunk_part_key(field: &str, index: usize) -> String {
    format!("{}{}{}", field, CHUNK_PART_INFIX, index)
}

/// `true` if `property` belongs to the property group of `field`.
fn belongs_to(property: &str, field: &str) -> bool {
    let Some(rest) = property.strip_prefix(field) else {
        return false;
    };
    if rest.is_empty() || rest == IS_CHUNKED_SUFFIX || rest == CHUNK_COUNT_SUFFIX {
        return true;
    }
    match rest.strip_prefix(CHUNK_PART_INFIX) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// How one eligible field is held in the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredField {
    Plain(String),
    Chunked(Vec<String>),
}

impl StoredField {
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        matches!(self, StoredField::Chunked(_))
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        match self {
            StoredField::Plain(_) => 1,
            StoredField::Chunked(parts) => parts.len(),
        }
    }

    /// Stored bytes across all parts.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        match self {
            StoredField::Plain(s) => s.len(),
            StoredField::Chunked(parts) => parts.iter().map(String::len).sum(),
        }
    }
}

/// What happened to one eligible field on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub name: String,
    /// Serialized size before compression.
    pub serialized_bytes: usize,
    pub stored_bytes: usize,
    pub compressed: bool,
    pub parts: usize,
    pub chunked: bool,
    /// Replaced by a degraded summary.
    pub degraded: bool,
}

/// A record after the per-field decisions, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub partition_key: String,
    pub row_key: String,
    pub scalars: BTreeMap<String, PropertyValue>,
    pub fields: BTreeMap<String, StoredField>,
    pub reports: BTreeMap<String, FieldReport>,
}

impl EncodedRecord {
    /// Flattens into the property convention. Built fresh on every call so a
    /// write always carries the complete set of chunk properties.
    pub fn to_entity(&self) -> StorageEntity {
        let mut entity = StorageEntity::new(self.partition_key.clone(), self.row_key.clone());
        for (name, value) in &self.scalars {
            entity.insert(name.clone(), value.clone());
        }
        for (name, field) in &self.fields {
            match field {
                StoredField::Plain(text) => {
                    entity.insert(name.clone(), text.clone());
                }
                StoredField::Chunked(parts) => {
                    entity.insert(is_chunked_key(name), true);
                    entity.insert(chunk_count_key(name), parts.len() as i64);
                    for (i, part) in parts.iter().enumerate() {
                        entity.insert(chunk_part_key(name, i), part.clone());
                    }
                }
            }
        }
        entity
    }
}

/// Maps JSON scalars onto table-store property types. `null` has no
/// property form; arrays and objects are stored as their JSON text.
fn scalar_property(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(PropertyValue::Int(i)),
            None => n.as_f64().map(PropertyValue::Double),
        },
        Value::String(s) => Some(PropertyValue::Str(s.clone())),
        Value::Array(_) | Value::Object(_) => Some(PropertyValue::Str(value.to_string())),
    }
}

fn property_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Int(i) => Value::Number((*i).into()),
        PropertyValue::Double(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        PropertyValue::Str(s) => Value::String(s.clone()),
    }
}

/// Encodes records for a store with a per-property ceiling and decodes them
/// back.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    config: CodecConfig,
    schema: RecordSchema,
}

impl RecordCodec {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(config: CodecConfig, schema: RecordSchema) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, schema })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Parts never exceed the single-property limit, so anything over the
    /// limit always splits into at least two parts.
    fn part_size(&self) -> usize {
        self.config.max_part_bytes.min(self.config.max_property_bytes)
    }

    /// Applies the chunk-or-store decision to every eligible field; other
    /// fields become scalar properties.
    pub fn encode(&self, record: &Record) -> EncodedRecord {
        let mut encoded = EncodedRecord {
            partition_key: record.partition_key.clone(),
            row_key: record.row_key.clone(),
            scalars: BTreeMap::new(),
            fields: BTreeMap::new(),
            reports: BTreeMap::new(),
        };

        for (name, doc) in &record.fields {
            if self.schema.is_chunked_field(name) {
                let (field, report) = self.encode_field(name, doc);
                encoded.fields.insert(name.clone(), field);
                encoded.reports.insert(name.clone(), report);
                continue;
            }
            let property = match doc {
                Document::Json(v) => scalar_property(v),
                Document::Text(s) => Some(PropertyValue::Str(s.clone())),
            };
            if let Some(p) = property {
                encoded.scalars.insert(name.clone(), p);
            }
        }

        encoded
    }

    fn encode_field(&self, name: &str, doc: &Document) -> (StoredField, FieldReport) {
        let serialized = doc.serialize();
        let size = size_of(&serialized);
        let limit = self.config.max_property_bytes;
        let part_size = self.part_size();

        let mut report = FieldReport {
            name: name.to_string(),
            serialized_bytes: size,
            stored_bytes: size,
            compressed: false,
            parts: 1,
            chunked: false,
            degraded: false,
        };

        if size <= limit {
            debug!("field '{}': {} bytes, stored whole", name, size);
            return (StoredField::Plain(serialized.into_owned()), report);
        }

        let mut data: Cow<'_, str> = serialized;
        let over_ceiling = part_count_for(size, part_size) > self.config.max_chunk_count;
        if size > self.config.compression_threshold || over_ceiling {
            let compact = compress(&data);
            if compact.len() < data.len() {
                debug!("field '{}': compressed {} -> {} bytes", name, size, compact.len());
                report.compressed = true;
                data = Cow::Owned(compact);
            }
        }

        report.stored_bytes = data.len();
        if data.len() <= limit {
            debug!("field '{}': {} bytes after compression, stored whole", name, data.len());
            return (StoredField::Plain(data.into_owned()), report);
        }

        let set = split(&data, part_size);
        if set.part_count() > self.config.max_chunk_count {
            warn!(
                "field '{}': {} parts exceeds ceiling of {}, writing anyway",
                name,
                set.part_count(),
                self.config.max_chunk_count
            );
        }
        debug!(
            "field '{}': {} bytes split into {} parts of <= {} bytes",
            name,
            data.len(),
            set.part_count(),
            part_size
        );

        report.parts = set.part_count();
        report.chunked = true;
        (StoredField::Chunked(set.into_parts()), report)
    }

    /// Replaces fields of `encoded` with degraded summaries built from the
    /// original values in `record`.
    ///
    /// Every field that was stored chunked is degraded. If none was, the
    /// rejection came from the entity as a whole and every eligible field is
    /// degraded. Scalars are kept as they were.
    pub fn degrade(&self, record: &Record, encoded: &EncodedRecord) -> EncodedRecord {
        let chunked: Vec<String> = encoded
            .fields
            .iter()
            .filter(|(_, f)| f.is_chunked())
            .map(|(name, _)| name.clone())
            .collect();
        let targets: Vec<String> = if chunked.is_empty() {
            encoded.fields.keys().cloned().collect()
        } else {
            chunked
        };

        // a summary is stored as one property, so it must fit in one
        let mut limits = self.config.summary;
        limits.max_summary_bytes = limits.max_summary_bytes.min(self.config.max_property_bytes);

        let mut degraded = encoded.clone();
        for name in targets {
            let Some(doc) = record.get(&name) else {
                continue;
            };
            let serialized_bytes = size_of(&doc.serialize());
            let value = doc.to_value().unwrap_or(Value::Null);
            let summary = summarize(&value, serialized_bytes, &limits)
                .to_value()
                .to_string();

            debug!(
                "field '{}': degraded {} bytes to a {} byte summary",
                name,
                serialized_bytes,
                summary.len()
            );
            degraded.reports.insert(
                name.clone(),
                FieldReport {
                    name: name.clone(),
                    serialized_bytes,
                    stored_bytes: summary.len(),
                    compressed: false,
                    parts: 1,
                    chunked: false,
                    degraded: true,
                },
            );
            degraded.fields.insert(name, StoredField::Plain(summary));
        }
        degraded
    }

    /// Decodes an entity. Never fails: missing chunk parts yield partial
    /// data and unparsable text yields a placeholder, each recorded as a
    /// [`FieldIssue`].
    pub fn decode(&self, entity: &StorageEntity) -> DecodedRecord {
        let mut record = DecodedRecord {
            partition_key: entity.partition_key.clone(),
            row_key: entity.row_key.clone(),
            ..Default::default()
        };

        for field in self.schema.chunked_fields() {
            let chunked = entity
                .get(&is_chunked_key(field))
                .and_then(PropertyValue::as_bool)
                .unwrap_or(false);

            let text = if chunked {
                self.gather_chunks(entity, field, &mut record.issues)
            } else {
                match entity.get(field) {
                    Some(PropertyValue::Str(s)) => s.clone(),
                    Some(other) => {
                        record.fields.insert(field.to_string(), property_value(other));
                        continue;
                    }
                    None => continue,
                }
            };

            let (value, issue) = parse_field(field, &text);
            record.fields.insert(field.to_string(), value);
            record.issues.extend(issue);
        }

        for (name, value) in entity.iter() {
            let owned = self.schema.chunked_fields().any(|f| belongs_to(name, f));
            if !owned {
                record.fields.insert(name.clone(), property_value(value));
            }
        }

        record
    }

    /// Parts of `field` present in the entity, by index. Only canonical
    /// `F_chunk<N>` names holding strings count.
    fn present_parts<'a>(entity: &'a StorageEntity, field: &str) -> BTreeMap<usize, &'a str> {
        let prefix = format!("{}{}", field, CHUNK_PART_INFIX);
        entity
            .iter()
            .filter_map(|(name, value)| {
                let digits = name.strip_prefix(&prefix)?;
                let canonical = !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && (digits == "0" || !digits.starts_with('0'));
                if !canonical {
                    return None;
                }
                Some((digits.parse::<usize>().ok()?, value.as_str()?))
            })
            .collect()
    }

    fn gather_chunks(&self, entity: &StorageEntity, field: &str, issues: &mut Vec<FieldIssue>) -> String {
        let present = Self::present_parts(entity, field);

        let declared = entity
            .get(&chunk_count_key(field))
            .and_then(PropertyValue::as_int)
            .and_then(|n| usize::try_from(n).ok());
        let expected = match declared {
            Some(n) => n,
            None => {
                // no usable count: take every consecutive part present
                let found = present
                    .keys()
                    .enumerate()
                    .take_while(|(pos, i)| pos == *i)
                    .count();
                warn!("field '{}': chunk count missing, found {} parts", field, found);
                found
            }
        };

        // work is bounded by the parts present, never by the declared count
        let out = reconstruct_indexed(present.iter().map(|(i, part)| (*i, *part)), expected);

        if !out.is_complete() {
            warn!(
                "field '{}': {} of {} chunk parts missing, returning partial data ({} bytes)",
                field,
                out.missing_count,
                expected,
                out.data.len()
            );
            issues.push(FieldIssue::MissingChunks {
                field: field.to_string(),
                expected,
                missing_count: out.missing_count,
                missing: out.missing.clone(),
            });
        }
        out.into_string()
    }
}
