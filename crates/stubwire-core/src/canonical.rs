// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical request keys.
//!
//! A key is the JSON text `{"query":<printed document>,"variables":<vars>}`
//! where:
//! - the document is printed canonically (sorted selections and arguments),
//!   after shape normalization when the request asks for it
//! - variables are encoded with object keys sorted at every level
//! - floats that encode an integral value are written as integers
//!
//! Both components are written as complete JSON values, so the encoding is
//! injective: distinct (document, variables) pairs never share a key.

use crate::error::MockError;
use crate::mocks::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use stubwire_doc::print_canonical;

/// Lookup key for a request. Pure function of printed document and variables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain-separated blake3 digest of the key text.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"stubwire-key:");
        hasher.update(self.0.as_bytes());
        hasher.finalize().into()
    }

    /// Short hex label for logs and error messages.
    pub fn label(&self) -> String {
        hex::encode(&self.digest()[..6])
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the canonical key of `request`.
///
/// `marker` is the field injected when `request.normalize_shape` is set.
/// Fails with [`MockError::MalformedRequest`] when the document cannot be
/// printed.
pub fn canonical_key(request: &Request, marker: &str) -> Result<CanonicalKey, MockError> {
    let printed = if request.normalize_shape {
        print_canonical(&request.query.with_shape_marker(marker))?
    } else {
        print_canonical(&request.query)?
    };

    let mut out = String::with_capacity(printed.len() + 32);
    out.push_str("{\"query\":");
    enc_str(&printed, &mut out);
    out.push_str(",\"variables\":{");
    // BTreeMap iteration is already sorted by key bytes.
    for (i, (name, value)) in request.variables.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        enc_str(name, &mut out);
        out.push(':');
        enc_value(value, &mut out);
    }
    out.push_str("}}");
    Ok(CanonicalKey(out))
}

/// Canonical JSON text for an arbitrary value.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    enc_value(value, &mut out);
    out
}

// --- Encoder --------------------------------------------------------------

fn enc_value(v: &Value, out: &mut String) {
    match v {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => enc_number(n, out),
        Value::String(s) => enc_str(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, it) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                enc_value(it, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Map order depends on serde_json features; sort explicitly.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                enc_str(k, out);
                out.push(':');
                enc_value(val, out);
            }
            out.push('}');
        }
    }
}

#[allow(clippy::float_cmp)]
fn enc_number(n: &Number, out: &mut String) {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            // Integral floats are written as integers (1.0 and 1 match).
            if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
                #[allow(clippy::cast_possible_truncation)]
                let i = f as i64;
                out.push_str(&i.to_string());
                return;
            }
        }
    }
    out.push_str(&n.to_string());
}

fn enc_str(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stubwire_doc::{Document, Field, OperationDefinition, OperationKind, TypeRef};

    fn request() -> Request {
        Request::new(Document::operation(
            OperationDefinition::new(OperationKind::Query, Some("UserInfo"))
                .variable("name", TypeRef::named("String"))
                .select(
                    Field::new("user")
                        .argument("name", stubwire_doc::Value::variable("name"))
                        .select(Field::new("name")),
                ),
        ))
        .variable("name", "Changping Chen")
    }

    #[test]
    fn key_layout_is_query_then_variables() {
        let key = canonical_key(&request(), "__typename").unwrap();
        assert_eq!(
            key.as_str(),
            "{\"query\":\"query UserInfo($name: String) {\\n  user(name: $name) {\\n    name\\n  }\\n}\",\"variables\":{\"name\":\"Changping Chen\"}}"
        );
    }

    #[test]
    fn key_is_valid_json_with_both_components() {
        let key = canonical_key(&request(), "__typename").unwrap();
        let parsed: Value = serde_json::from_str(key.as_str()).unwrap();
        assert_eq!(parsed["variables"], json!({"name": "Changping Chen"}));
        assert!(parsed["query"].as_str().unwrap().starts_with("query UserInfo"));
    }

    #[test]
    fn nested_object_keys_are_sorted() {
        assert_eq!(
            canonical_json(&json!({"b": {"z": 1, "a": [true, null]}, "a": "x"})),
            "{\"a\":\"x\",\"b\":{\"a\":[true,null],\"z\":1}}"
        );
    }

    #[test]
    fn integral_floats_encode_as_integers() {
        assert_eq!(canonical_json(&json!(1.0)), "1");
        assert_eq!(canonical_json(&json!(-0.0)), "0");
        assert_eq!(canonical_json(&json!(1.5)), "1.5");
        assert_eq!(canonical_json(&json!(12)), "12");
    }

    #[test]
    fn strings_escape_control_characters() {
        assert_eq!(canonical_json(&json!("a\"b\\c\u{1}")), "\"a\\\"b\\\\c\\u0001\"");
    }

    #[test]
    fn label_is_stable_and_short() {
        let key = canonical_key(&request(), "__typename").unwrap();
        assert_eq!(key.label(), canonical_key(&request(), "__typename").unwrap().label());
        assert_eq!(key.label().len(), 12);
    }

    #[test]
    fn malformed_document_has_no_key() {
        let bad = Request::new(Document::default());
        assert!(matches!(
            canonical_key(&bad, "__typename"),
            Err(MockError::MalformedRequest(_))
        ));
    }
}
