use super::*;

// -------------------- Defaults --------------------

#[test]
fn defaults_are_valid() {
    assert!(CodecConfig::default().validate().is_ok());
    assert!(StoreLimits::default().validate().is_ok());
}

#[test]
fn default_parts_fit_default_store_property() {
    let codec = CodecConfig::default();
    let store = StoreLimits::default();
    assert!(codec.max_part_bytes <= store.max_property_bytes);
    assert!(codec.max_property_bytes <= store.max_property_bytes);
}

#[test]
fn with_limit_sets_both_sizes() {
    let c = CodecConfig::default().with_limit(50_000);
    assert_eq!(c.max_property_bytes, 50_000);
    assert_eq!(c.max_part_bytes, 50_000);
    assert_eq!(c.max_chunk_count, DEFAULT_MAX_CHUNK_COUNT);
}

// -------------------- Validation --------------------

#[test]
fn zero_part_size_rejected() {
    let c = CodecConfig {
        max_part_bytes: 0,
        ..Default::default()
    };
    assert_eq!(c.validate(), Err(ConfigError::Zero("max_part_bytes")));
}

#[test]
fn zero_chunk_ceiling_rejected() {
    let c = CodecConfig {
        max_chunk_count: 0,
        ..Default::default()
    };
    assert_eq!(c.validate(), Err(ConfigError::Zero("max_chunk_count")));
}

#[test]
fn zero_store_limit_rejected() {
    let l = StoreLimits {
        max_properties: 0,
        ..Default::default()
    };
    assert!(l.validate().is_err());
    assert!(StoreLimits::unbounded().validate().is_ok());
}

// -------------------- Environment --------------------

// Each test uses its own variable so parallel tests do not interfere.
#[test]
fn env_or_parses_and_falls_back() {
    std::env::set_var("CHUNKSTORE_TEST_PARSE", " 1234 ");
    assert_eq!(env_or("CHUNKSTORE_TEST_PARSE", 7), 1234);

    std::env::set_var("CHUNKSTORE_TEST_GARBAGE", "lots");
    assert_eq!(env_or("CHUNKSTORE_TEST_GARBAGE", 7), 7);

    assert_eq!(env_or("CHUNKSTORE_TEST_UNSET_VARIABLE", 9), 9);
}

// -------------------- Serde --------------------

#[test]
fn partial_json_uses_defaults() {
    let c: CodecConfig = serde_json::from_str(r#"{"max_chunk_count": 12}"#).unwrap();
    assert_eq!(c.max_chunk_count, 12);
    assert_eq!(c.max_part_bytes, DEFAULT_MAX_PART_BYTES);
    assert_eq!(c.summary, SummaryLimits::default());
}
