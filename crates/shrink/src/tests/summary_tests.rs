use crate::{compress, summarize, DegradedSummary, SUMMARY_ERROR};
use config::SummaryLimits;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn assessment() -> Value {
    json!({
        "score": {"overall": 73, "license": 64.5, "secureScore": 58},
        "tenant": {"displayName": "Contoso", "id": "tenant-123"},
        "licenseInfo": {
            "skus": [
                {"skuPartNumber": "ENTERPRISEPACK", "total": 50, "assigned": 47, "trial": false,
                 "description": "x".repeat(500)},
                {"skuPartNumber": "EMS", "total": 10, "assigned": 2, "services": ["a", "b"]},
            ],
        },
        "recommendations": (0..30).map(|i| json!({"id": i, "title": format!("rec {}", i)})).collect::<Vec<_>>(),
        "notes": "free text",
    })
}

fn limits() -> SummaryLimits {
    SummaryLimits::default()
}

#[test]
fn keeps_score_triple() {
    let s = summarize(&assessment(), 999, &limits());
    assert_eq!(s.score.overall, Some(73.into()));
    assert_eq!(s.score.secure_score, Some(58.into()));
    assert_eq!(s.to_value()["score"]["license"], json!(64.5));
}

#[test]
fn overall_score_survives_transformations() {
    let original = assessment();
    let pretty = serde_json::to_string_pretty(&original).unwrap();
    let compact: Value = serde_json::from_str(&compress(&pretty)).unwrap();

    for doc in [original, compact] {
        let v = summarize(&doc, 1, &limits()).to_value();
        assert_eq!(v["score"]["overall"], json!(73));
    }
}

#[test]
fn non_numeric_score_is_absent_not_guessed() {
    let doc = json!({"score": {"overall": "73"}});
    let s = summarize(&doc, 10, &limits());
    assert!(s.score.overall.is_none());
    assert!(s.to_value().get("score").is_none());
}

#[test]
fn falls_back_to_top_level_score_fields() {
    let doc = json!({"overallScore": 40, "licenseScore": 12, "secureScore": {"current": 3}});
    let s = summarize(&doc, 10, &limits());
    assert_eq!(s.score.overall, Some(40.into()));
    assert_eq!(s.score.license, Some(12.into()));
    assert!(s.score.secure_score.is_none());
}

#[test]
fn keeps_tenant_identity() {
    let s = summarize(&assessment(), 1, &limits());
    let tenant = s.tenant.unwrap();
    assert_eq!(tenant.display_name.as_deref(), Some("Contoso"));
    assert_eq!(tenant.id.as_deref(), Some("tenant-123"));

    let flat = json!({"tenantId": "t-9"});
    let t = summarize(&flat, 1, &limits()).tenant.unwrap();
    assert_eq!(t.id.as_deref(), Some("t-9"));
    assert!(t.display_name.is_none());
}

#[test]
fn lists_are_counted_and_truncated() {
    let s = summarize(&assessment(), 1, &limits());
    assert_eq!(s.counts["recommendations"], 30);
    assert_eq!(s.counts["licenseInfo.skus"], 2);

    let recs = &s.breakdowns["recommendations"];
    assert_eq!(recs.total, 30);
    assert_eq!(recs.entries.len(), limits().max_list_entries);
}

#[test]
fn entries_keep_only_quantitative_fields() {
    let s = summarize(&assessment(), 1, &limits());
    let skus = &s.breakdowns["licenseInfo.skus"];
    assert_eq!(
        skus.entries[0],
        json!({"skuPartNumber": "ENTERPRISEPACK", "total": 50, "assigned": 47, "trial": false})
    );
    assert_eq!(skus.entries[1], json!({"skuPartNumber": "EMS", "total": 10, "assigned": 2}));
}

#[test]
fn breakdown_count_is_bounded() {
    let mut root = serde_json::Map::new();
    for i in 0..20 {
        root.insert(format!("list{:02}", i), json!([1, 2, 3]));
    }
    let s = summarize(&Value::Object(root), 1, &limits());
    assert_eq!(s.counts.len(), 20);
    assert_eq!(s.breakdowns.len(), limits().max_breakdowns);
}

#[test]
fn root_array_becomes_items() {
    let doc = json!(["short", "y".repeat(100), 5, {"nested": {"deep": 1}}]);
    let s = summarize(&doc, 1, &limits());
    assert_eq!(s.counts["items"], 4);
    assert_eq!(s.breakdowns["items"].entries, vec![json!("short"), json!(5)]);
}

#[test]
fn scalar_input_yields_marker_only() {
    let s = summarize(&json!("opaque"), 123, &limits());
    assert_eq!(s, DegradedSummary::marker(123));
    assert_eq!(
        s.to_value(),
        json!({"error": SUMMARY_ERROR, "degraded": true, "originalSize": 123})
    );
}

#[test]
fn summary_is_small() {
    let mut doc = assessment();
    doc["recommendations"] = json!((0..10_000)
        .map(|i| json!({"id": i, "detail": "z".repeat(200)}))
        .collect::<Vec<_>>());
    let original_size = doc.to_string().len();
    let s = summarize(&doc, original_size, &limits());
    assert!(s.to_value().to_string().len() < 4_096);
    assert_eq!(s.original_size, original_size);
}

#[test]
fn wide_entry_keeps_bounded_fields() {
    let mut wide = serde_json::Map::new();
    for i in 0..5_000 {
        wide.insert(format!("metric{:04}", i), json!(i));
    }
    let doc = json!({"score": {"overall": 73}, "controls": [Value::Object(wide)]});
    let original_size = doc.to_string().len();

    let s = summarize(&doc, original_size, &limits());
    let entry = s.breakdowns["controls"].entries[0].as_object().unwrap();
    assert_eq!(entry.len(), limits().max_entry_fields);
    assert_eq!(s.score.overall, Some(73.into()));

    let stored = s.to_value().to_string().len();
    assert!(stored < 1_000, "summary is {} bytes", stored);
    assert!(stored < original_size);
}

#[test]
fn long_names_are_cut() {
    let long = "k".repeat(500);
    let mut entry = serde_json::Map::new();
    entry.insert(long.clone(), json!(1));
    let mut root = serde_json::Map::new();
    root.insert(
        "tenant".to_string(),
        json!({"displayName": "d".repeat(500), "id": "tenant-1"}),
    );
    root.insert(long, json!([Value::Object(entry)]));

    let s = summarize(&Value::Object(root), 1, &limits());
    let max = limits().max_text_chars;

    let tenant = s.tenant.unwrap();
    assert_eq!(tenant.display_name.unwrap().chars().count(), max);
    assert_eq!(tenant.id.as_deref(), Some("tenant-1"));

    let name = "k".repeat(max);
    assert_eq!(s.counts[&name], 1);
    let kept = s.breakdowns[&name].entries[0].as_object().unwrap();
    assert_eq!(kept.get(&name), Some(&json!(1)));
}

#[test]
fn over_budget_drops_breakdowns_then_counts() {
    let mut root = serde_json::Map::new();
    root.insert("score".to_string(), json!({"overall": 73}));
    for i in 0..8 {
        let entries: Vec<Value> = (0..10)
            .map(|j| json!({"a": j, "b": j, "c": j, "d": j, "e": j, "f": j, "g": j, "h": j}))
            .collect();
        root.insert(format!("list{}", i), Value::Array(entries));
    }
    let doc = Value::Object(root);

    let roomy = summarize(&doc, 1, &limits());
    assert_eq!(roomy.breakdowns.len(), 8);

    let tight = SummaryLimits {
        max_summary_bytes: 600,
        ..limits()
    };
    let s = summarize(&doc, 1, &tight);
    assert!(s.breakdowns.len() < 8);
    assert_eq!(s.counts.len(), 8);
    assert!(s.to_value().to_string().len() <= 600);

    let tiny = SummaryLimits {
        max_summary_bytes: 1,
        ..limits()
    };
    let s = summarize(&doc, 1, &tiny);
    assert!(s.breakdowns.is_empty());
    assert!(s.counts.is_empty());
    assert_eq!(s.score.overall, Some(73.into()));
    assert!(s.degraded);
}
