/// Whitespace-eliminating JSON re-serialization.
///
/// Parsing and re-emitting drops indentation, newlines and padding. Object
/// keys come back in sorted order, which makes a second pass byte-identical
/// to the first.
use log::warn;
use serde_json::Value;

/// Returns the compact form of `serialized`.
///
/// Input that is not valid JSON is returned unchanged: compression is a size
/// optimization and never fails a write.
pub fn compress(serialized: &str) -> String {
    match serde_json::from_str::<Value>(serialized) {
        Ok(value) => value.to_string(),
        Err(e) => {
            warn!(
                "compress: input of {} bytes is not valid JSON ({}), leaving it unchanged",
                serialized.len(),
                e
            );
            serialized.to_string()
        }
    }
}
