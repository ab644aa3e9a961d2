use super::helpers::*;
use crate::*;
use anyhow::Result;
use serde_json::json;

const PK: &str = "tenant-0001";
const RK: &str = "assessment-2024-05-01";

#[test]
fn stores_large_documents_whole() -> Result<()> {
    let mut store = DocumentStore::new();
    let metrics = assessment_metrics(2_000);
    let report = store.create(&assessment_record(metrics.clone()))?;

    let field = report.field("metrics").unwrap();
    assert!(!field.chunked);
    assert!(!field.compressed);
    assert_eq!(field.serialized_bytes, metrics.to_string().len());

    let read = store.read(PK, RK)?;
    assert_eq!(read.get("metrics"), Some(&metrics));
    assert!(read.is_clean());
    Ok(())
}

#[test]
fn text_fields_are_parsed_on_read() -> Result<()> {
    let mut store = DocumentStore::new();
    let record = Record::new(PK, RK)
        .with("metrics", Document::Text("{\n  \"a\": 1\n}".to_string()))
        .with("recommendations", Document::Text("not json".to_string()));
    store.create(&record)?;

    let read = store.read(PK, RK)?;
    assert_eq!(read.get("metrics"), Some(&json!({"a": 1})));
    assert_eq!(read.issues.len(), 1);
    assert_eq!(read.issues[0].field(), "recommendations");
    assert_eq!(read.get("recommendations").unwrap()["error"], json!(PARSE_ERROR_MARKER));
    Ok(())
}

#[test]
fn create_replace_upsert_delete() -> Result<()> {
    let mut store = DocumentStore::new();
    let record = assessment_record(json!({"v": 1}));

    assert!(store.replace(&record).unwrap_err().store_error().is_not_found());
    store.create(&record)?;
    assert!(store.create(&record).unwrap_err().store_error().is_duplicate());

    store.upsert(&assessment_record(json!({"v": 2})))?;
    assert_eq!(store.len(), 1);
    assert_eq!(store.read(PK, RK)?.get("metrics"), Some(&json!({"v": 2})));

    store.delete(PK, RK)?;
    assert!(store.is_empty());
    assert!(store.read(PK, RK).unwrap_err().is_not_found());
    assert!(store.delete(PK, RK).unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn both_backends_read_back_the_same_record() -> Result<()> {
    let record = assessment_record(assessment_metrics(25)).with("recommendations", json!(["a", "b"]));

    let mut backends: Vec<Box<dyn AssessmentStore>> = vec![
        Box::new(DocumentStore::new()),
        Box::new(memory_store(
            CodecConfig::default().with_limit(1_000),
            store::StoreLimits::default(),
        )),
    ];

    let mut reads = Vec::new();
    for backend in backends.iter_mut() {
        backend.create(&record)?;
        reads.push(backend.read(PK, RK)?);
    }
    assert_eq!(reads[0].get("metrics"), reads[1].get("metrics"));
    assert_eq!(reads[0].get("recommendations"), reads[1].get("recommendations"));
    Ok(())
}
