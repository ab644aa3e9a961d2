use crate::compress;
use serde_json::{json, Value};

#[test]
fn strips_formatting_whitespace() {
    let pretty = "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    null\n  ]\n}";
    assert_eq!(compress(pretty), r#"{"a":1,"b":[true,null]}"#);
}

#[test]
fn preserves_whitespace_inside_strings() {
    let pretty = "{ \"text\" : \"two  spaces\\nand newline\" }";
    let out = compress(pretty);
    let v: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["text"], "two  spaces\nand newline");
}

#[test]
fn second_pass_is_identical() {
    let inputs = [
        "{ \"z\": 1, \"a\": { \"y\": [1, 2.5, -3e10], \"b\": \"x\" } }",
        "[ 0.1, 0.2, 0.30000000000000004, 1e-7, 123456789012345678 ]",
        "\"just a string\"",
        "  42  ",
    ];
    for input in inputs {
        let once = compress(input);
        assert_eq!(compress(&once), once, "not idempotent for {}", input);
    }
}

#[test]
fn is_lossless() {
    let value = json!({
        "score": {"overall": 73, "license": 81.5},
        "recommendations": [{"id": "r1", "text": "enable MFA"}],
    });
    let pretty = serde_json::to_string_pretty(&value).unwrap();
    let out = compress(&pretty);
    assert!(out.len() < pretty.len());
    assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), value);
}

#[test]
fn invalid_json_is_returned_unchanged() {
    let broken = "{\"a\": 1,, }";
    assert_eq!(compress(broken), broken);
    assert_eq!(compress(""), "");
}
