//! # Config - ChunkStore tunables
//!
//! Every threshold the chunking codec and the bundled stores act on lives
//! here. None of them are hard-coded elsewhere: the ceilings are a property of
//! whichever key-value store is plugged in, so they are loaded per deployment.
//!
//! ## Environment
//!
//! ```text
//! CHUNKSTORE_PROPERTY_LIMIT        single-property limit in bytes  (default: 50000)
//! CHUNKSTORE_PART_SIZE             max bytes per chunk part        (default: 40000)
//! CHUNKSTORE_MAX_CHUNKS            chunk-count ceiling per field   (default: 200)
//! CHUNKSTORE_COMPRESS_AT           compression trigger in bytes    (default: 100000)
//! CHUNKSTORE_STORE_PROPERTY_LIMIT  store: max bytes per property   (default: 65536)
//! CHUNKSTORE_STORE_MAX_PROPERTIES  store: max properties per entity (default: 255)
//! CHUNKSTORE_STORE_ENTITY_LIMIT    store: max bytes per entity     (default: 1048576)
//! ```
//!
//! Unset or unparsable variables fall back to the default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default single-property limit used by the codec (bytes).
pub const DEFAULT_MAX_PROPERTY_BYTES: usize = 50_000;
/// Default maximum size of one chunk part (bytes).
pub const DEFAULT_MAX_PART_BYTES: usize = 40_000;
/// Default ceiling on chunk parts per field.
pub const DEFAULT_MAX_CHUNK_COUNT: usize = 200;
/// Default size above which a field is compressed before splitting (bytes).
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 100_000;

/// Default serialized size budget for a degraded summary (bytes).
pub const DEFAULT_MAX_SUMMARY_BYTES: usize = 8_192;

/// Errors produced by [`CodecConfig::validate`] and [`StoreLimits::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Bounds applied when a document is reduced to a degraded summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLimits {
    /// Entries kept per list-shaped breakdown.
    pub max_list_entries: usize,
    /// Strings longer than this (in characters) are dropped from entries.
    pub max_text_chars: usize,
    /// Number of list-shaped breakdowns kept.
    pub max_breakdowns: usize,
    /// Fields kept per breakdown entry.
    pub max_entry_fields: usize,
    /// Serialized size a summary is cut down to, dropping breakdowns and
    /// then counts. The codec further clamps it to the property limit.
    pub max_summary_bytes: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            max_list_entries: 10,
            max_text_chars: 64,
            max_breakdowns: 8,
            max_entry_fields: 8,
            max_summary_bytes: DEFAULT_MAX_SUMMARY_BYTES,
        }
    }
}

/// Thresholds driving the per-field chunk-or-store decision.
///
/// # Write decision
///
/// ```text
/// size <= max_property_bytes          -> single property
/// size >  compression_threshold       -> compress, then split
/// parts > max_chunk_count             -> compress, re-split (kept even if still over)
/// otherwise                           -> split into max_part_bytes parts
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest serialized field stored as one property.
    pub max_property_bytes: usize,
    /// Largest single chunk part.
    pub max_part_bytes: usize,
    /// Practical ceiling on chunk parts per field.
    pub max_chunk_count: usize,
    /// Serialized size that triggers compression before splitting.
    pub compression_threshold: usize,
    pub summary: SummaryLimits,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_property_bytes: DEFAULT_MAX_PROPERTY_BYTES,
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            max_chunk_count: DEFAULT_MAX_CHUNK_COUNT,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            summary: SummaryLimits::default(),
        }
    }
}

impl CodecConfig {
    /// Loads the codec thresholds from `CHUNKSTORE_*` variables.
    pub fn from_env() -> Self {
        Self {
            max_property_bytes: env_or("CHUNKSTORE_PROPERTY_LIMIT", DEFAULT_MAX_PROPERTY_BYTES),
            max_part_bytes: env_or("CHUNKSTORE_PART_SIZE", DEFAULT_MAX_PART_BYTES),
            max_chunk_count: env_or("CHUNKSTORE_MAX_CHUNKS", DEFAULT_MAX_CHUNK_COUNT),
            compression_threshold: env_or("CHUNKSTORE_COMPRESS_AT", DEFAULT_COMPRESSION_THRESHOLD),
            summary: SummaryLimits::default(),
        }
    }

    /// Sets the single-property limit and the part size to the same value.
    #[must_use]
    pub fn with_limit(mut self, bytes: usize) -> Self {
        self.max_property_bytes = bytes;
        self.max_part_bytes = bytes;
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] if any size or ceiling is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_property_bytes == 0 {
            return Err(ConfigError::Zero("max_property_bytes"));
        }
        if self.max_part_bytes == 0 {
            return Err(ConfigError::Zero("max_part_bytes"));
        }
        if self.max_chunk_count == 0 {
            return Err(ConfigError::Zero("max_chunk_count"));
        }
        Ok(())
    }
}

/// Hard limits enforced by a table-store backend.
///
/// The defaults mirror a typical cloud table store: 64 KiB per property,
/// 255 properties (keys included) and 1 MiB per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLimits {
    pub max_property_bytes: usize,
    pub max_properties: usize,
    pub max_entity_bytes: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_property_bytes: 64 * 1024,
            max_properties: 255,
            max_entity_bytes: 1024 * 1024,
        }
    }
}

impl StoreLimits {
    /// Loads store limits from `CHUNKSTORE_STORE_*` variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_property_bytes: env_or("CHUNKSTORE_STORE_PROPERTY_LIMIT", d.max_property_bytes),
            max_properties: env_or("CHUNKSTORE_STORE_MAX_PROPERTIES", d.max_properties),
            max_entity_bytes: env_or("CHUNKSTORE_STORE_ENTITY_LIMIT", d.max_entity_bytes),
        }
    }

    /// Limits that never reject anything. Useful for backends without a ceiling.
    pub fn unbounded() -> Self {
        Self {
            max_property_bytes: usize::MAX,
            max_properties: usize::MAX,
            max_entity_bytes: usize::MAX,
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] if any limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_property_bytes == 0 {
            return Err(ConfigError::Zero("max_property_bytes"));
        }
        if self.max_properties == 0 {
            return Err(ConfigError::Zero("max_properties"));
        }
        if self.max_entity_bytes == 0 {
            return Err(ConfigError::Zero("max_entity_bytes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
