use super::helpers::*;
use crate::*;
use anyhow::Result;
use serde_json::json;
use store::{PropertyValue, StoreLimits};

const PK: &str = "tenant-0001";
const RK: &str = "assessment-2024-05-01";

#[test]
fn missing_record_is_not_found() {
    let store = memory_store(CodecConfig::default(), StoreLimits::default());
    let err = store.read(PK, "nope").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn lost_part_reads_partial_with_issue() -> Result<()> {
    let mut store = memory_store(CodecConfig::default().with_limit(1_000), StoreLimits::default());
    store.create(&assessment_record(assessment_metrics(20)))?;

    let entity = store.gateway_mut().get_mut(PK, RK).unwrap();
    entity.remove("metrics_chunk2");

    let read = store.read(PK, RK)?;
    assert!(!read.is_clean());
    assert!(matches!(
        &read.issues[0],
        FieldIssue::MissingChunks { field, missing, .. } if field == "metrics" && missing == &vec![2]
    ));
    assert_eq!(read.get("metrics").unwrap()["error"], json!(PARSE_ERROR_MARKER));
    assert_eq!(read.get("status"), Some(&json!("completed")));
    Ok(())
}

#[test]
fn tampered_text_reads_as_placeholder() -> Result<()> {
    let mut store = memory_store(CodecConfig::default(), StoreLimits::default());
    store.create(&assessment_record(json!({"a": 1})))?;
    store
        .gateway_mut()
        .get_mut(PK, RK)
        .unwrap()
        .insert("metrics", "{\"a\": ");

    let read = store.read(PK, RK)?;
    assert_eq!(read.issues.len(), 1);
    assert_eq!(read.issues[0].field(), "metrics");
    let placeholder = read.get("metrics").unwrap();
    assert_eq!(placeholder["error"], json!(PARSE_ERROR_MARKER));
    assert_eq!(placeholder["rawLength"], json!(6));
    assert!(placeholder["parseError"].is_string());
    Ok(())
}

#[test]
fn read_entity_exposes_layout() -> Result<()> {
    let mut store = memory_store(CodecConfig::default().with_limit(1_000), StoreLimits::default());
    store.create(&assessment_record(assessment_metrics(10)))?;

    let entity = store.read_entity(PK, RK)?;
    let count = entity
        .get("metrics_chunkCount")
        .and_then(PropertyValue::as_int)
        .unwrap();
    for i in 0..count {
        assert!(entity.contains(&format!("metrics_chunk{}", i)));
    }
    assert!(!entity.contains(&format!("metrics_chunk{}", count)));
    assert!(!entity.contains("metrics"));
    Ok(())
}

#[test]
fn decoded_record_keeps_keys() -> Result<()> {
    let mut store = memory_store(CodecConfig::default(), StoreLimits::default());
    store.create(&assessment_record(json!([])))?;

    let read = store.read(PK, RK)?;
    assert_eq!(read.partition_key, PK);
    assert_eq!(read.row_key, RK);
    assert_eq!(read.get("metrics"), Some(&json!([])));
    assert!(!read.is_degraded("metrics"));
    Ok(())
}
