/// Degraded summaries.
///
/// When a document cannot be stored even in chunked form it is replaced by a
/// [`DegradedSummary`]: an error marker, the original size, and the parts of
/// an assessment that keep the record useful on a dashboard.
///
/// ## Input shape
///
/// The summarizer reads a partial, loosely-typed assessment schema. Every
/// lookup is optional; whatever is missing is left out of the summary.
///
/// ```text
/// score.{overall,license,secureScore}       (or scores.*, or top-level
///                                            overallScore/licenseScore/secureScore)
/// tenant.{displayName,id}                   (or tenantInfo.*, or top-level
///                                            tenantDisplayName/tenantId)
/// <key>: [ ... ]                            -> counts + breakdown "<key>"
/// <key>: { <inner>: [ ... ] }               -> counts + breakdown "<key>.<inner>"
/// [ ... ] at the root                       -> counts + breakdown "items"
/// ```
///
/// Scores are copied as the exact JSON number found, never coerced: a string
/// `"73"` is treated as absent rather than guessed at.
///
/// ## Size bound
///
/// Entries keep at most `max_entry_fields` fields. Keys, list names and
/// tenant strings are cut to `max_text_chars` characters. If the result is
/// still over `max_summary_bytes`, breakdowns and then counts are dropped.
use config::SummaryLimits;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Error marker carried by every summary.
pub const SUMMARY_ERROR: &str = "Data too large for storage";

/// Upper bound on the number of entries in [`DegradedSummary::counts`].
const MAX_COUNTS: usize = 64;

/// The overall / license / secure-score triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTriple {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_score: Option<Number>,
}

impl ScoreTriple {
    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.license.is_none() && self.secure_score.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A list-shaped breakdown cut down to its first entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Length of the original list.
    pub total: usize,
    /// Leading entries reduced to their quantitative fields.
    pub entries: Vec<Value>,
}

/// Fixed-shape substitute for a document the store would not accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedSummary {
    pub error: String,
    pub degraded: bool,
    /// Serialized byte size of the document this summary replaces.
    pub original_size: usize,
    #[serde(default, skip_serializing_if = "ScoreTriple::is_empty")]
    pub score: ScoreTriple,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantIdentity>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdowns: BTreeMap<String, Breakdown>,
}

impl DegradedSummary {
    /// An empty summary: marker and size only.
    pub fn marker(original_size: usize) -> Self {
        Self {
            error: SUMMARY_ERROR.to_string(),
            degraded: true,
            original_size,
            score: ScoreTriple::default(),
            tenant: None,
            counts: BTreeMap::new(),
            breakdowns: BTreeMap::new(),
        }
    }

    /// The summary as a JSON value, ready to be stored like any document.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            warn!("summary: failed to serialize ({}), storing marker only", e);
            serde_json::json!({
                "error": SUMMARY_ERROR,
                "degraded": true,
                "originalSize": self.original_size,
            })
        })
    }
}

/// Builds the summary of `original`, which serialized to `original_size` bytes.
///
/// Pure and infallible. Returns a new value and leaves `original` untouched.
pub fn summarize(original: &Value, original_size: usize, limits: &SummaryLimits) -> DegradedSummary {
    let mut summary = DegradedSummary::marker(original_size);

    match original {
        Value::Object(root) => {
            summary.score = scores(root);
            summary.tenant = tenant(root, limits.max_text_chars);
            collect_lists(root, limits, &mut summary);
        }
        Value::Array(items) => {
            summary.counts.insert("items".to_string(), items.len());
            summary
                .breakdowns
                .insert("items".to_string(), breakdown(items, limits));
        }
        _ => {}
    }

    fit_budget(&mut summary, limits.max_summary_bytes);
    summary
}

fn serialized_len(summary: &DegradedSummary) -> usize {
    serde_json::to_string(summary)
        .map(|s| s.len())
        .unwrap_or(usize::MAX)
}

/// Drops breakdowns, then counts, until the serialized summary fits in
/// `budget` bytes. Marker, score and tenant are always kept.
fn fit_budget(summary: &mut DegradedSummary, budget: usize) {
    let before = serialized_len(summary);
    if before <= budget {
        return;
    }
    while serialized_len(summary) > budget && summary.breakdowns.pop_last().is_some() {}
    while serialized_len(summary) > budget && summary.counts.pop_last().is_some() {}
    warn!(
        "summary: {} bytes exceeds the {} byte budget, trimmed to {} bytes",
        before,
        budget,
        serialized_len(summary)
    );
}

/// The first `max_chars` characters of `s`.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

fn number_at(obj: &Map<String, Value>, key: &str) -> Option<Number> {
    match obj.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn string_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn scores(root: &Map<String, Value>) -> ScoreTriple {
    let nested = ["score", "scores"]
        .iter()
        .filter_map(|k| root.get(*k).and_then(Value::as_object));

    let mut triple = ScoreTriple::default();
    for obj in nested {
        triple.overall = triple.overall.or_else(|| number_at(obj, "overall"));
        triple.license = triple.license.or_else(|| number_at(obj, "license"));
        triple.secure_score = triple.secure_score.or_else(|| number_at(obj, "secureScore"));
    }

    triple.overall = triple.overall.or_else(|| number_at(root, "overallScore"));
    triple.license = triple.license.or_else(|| number_at(root, "licenseScore"));
    // top-level "secureScore" is often an object with its own breakdown
    triple.secure_score = triple.secure_score.or_else(|| number_at(root, "secureScore"));
    triple
}

fn tenant(root: &Map<String, Value>, max_chars: usize) -> Option<TenantIdentity> {
    let mut identity = TenantIdentity::default();
    for key in ["tenant", "tenantInfo"] {
        if let Some(obj) = root.get(key).and_then(Value::as_object) {
            identity.display_name = identity.display_name.or_else(|| string_at(obj, "displayName"));
            identity.id = identity.id.or_else(|| string_at(obj, "id"));
        }
    }
    identity.display_name = identity
        .display_name
        .or_else(|| string_at(root, "tenantDisplayName"));
    identity.id = identity.id.or_else(|| string_at(root, "tenantId"));

    if identity.display_name.is_none() && identity.id.is_none() {
        return None;
    }
    identity.display_name = identity.display_name.map(|s| truncate_chars(&s, max_chars));
    identity.id = identity.id.map(|s| truncate_chars(&s, max_chars));
    Some(identity)
}

fn collect_lists(root: &Map<String, Value>, limits: &SummaryLimits, summary: &mut DegradedSummary) {
    let mut lists: Vec<(String, &Vec<Value>)> = Vec::new();
    for (key, value) in root {
        match value {
            Value::Array(items) => lists.push((truncate_chars(key, limits.max_text_chars), items)),
            Value::Object(inner) => {
                for (inner_key, inner_value) in inner {
                    if let Value::Array(items) = inner_value {
                        let name = format!("{}.{}", key, inner_key);
                        lists.push((truncate_chars(&name, limits.max_text_chars), items));
                    }
                }
            }
            _ => {}
        }
    }

    for (name, items) in lists.iter().take(MAX_COUNTS) {
        summary.counts.insert(name.clone(), items.len());
    }
    for (name, items) in lists.into_iter().take(limits.max_breakdowns) {
        summary.breakdowns.insert(name, breakdown(items, limits));
    }
}

fn breakdown(items: &[Value], limits: &SummaryLimits) -> Breakdown {
    Breakdown {
        total: items.len(),
        entries: items
            .iter()
            .take(limits.max_list_entries)
            .filter_map(|item| reduce_entry(item, limits))
            .collect(),
    }
}

/// Keeps numbers, booleans and short strings, at most `max_entry_fields` per
/// entry with keys cut to `max_text_chars`. Nested structures and long free
/// text are dropped.
fn reduce_entry(item: &Value, limits: &SummaryLimits) -> Option<Value> {
    let max_text_chars = limits.max_text_chars;
    match item {
        Value::Object(fields) => {
            let kept: Map<String, Value> = fields
                .iter()
                .filter(|(_, v)| is_quantitative(v, max_text_chars))
                .take(limits.max_entry_fields)
                .map(|(k, v)| (truncate_chars(k, max_text_chars), v.clone()))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        v if is_quantitative(v, max_text_chars) => Some(v.clone()),
        _ => None,
    }
}

fn is_quantitative(value: &Value, max_text_chars: usize) -> bool {
    match value {
        Value::Number(_) | Value::Bool(_) => true,
        Value::String(s) => s.chars().count() <= max_text_chars,
        _ => false,
    }
}
