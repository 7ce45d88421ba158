//! Typed field value codec.
//!
//! The store wraps every field in a single-key object naming its type
//! (`{"integerValue": "5"}`, `{"mapValue": {"fields": {...}}}`). Decoding
//! strips the wrappers into plain JSON so documents can be deserialized with
//! serde; encoding adds them back for writes.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A field value that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The wrapper names a type this codec does not know.
    #[error("unknown value kind: {0}")]
    UnknownKind(String),

    /// The wrapper is not a single-key object or its payload has the wrong shape.
    #[error("malformed {kind}: {detail}")]
    Malformed { kind: &'static str, detail: String },
}

fn malformed(kind: &'static str, detail: impl Into<String>) -> ValueError {
    ValueError::Malformed {
        kind,
        detail: detail.into(),
    }
}

/// Decode a document's `fields` object into plain JSON.
///
/// # Errors
///
/// Returns the first value that fails to decode.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, ValueError> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

/// Decode one typed value.
///
/// # Errors
///
/// Returns `UnknownKind` or `Malformed`.
pub fn decode_value(value: &Value) -> Result<Value, ValueError> {
    let Some(wrapper) = value.as_object() else {
        return Err(malformed("value", "expected an object"));
    };
    let mut entries = wrapper.iter();
    let (Some((kind, payload)), None) = (entries.next(), entries.next()) else {
        return Err(malformed("value", "expected exactly one value kind"));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => payload
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed("booleanValue", payload.to_string())),
        "integerValue" => decode_integer(payload),
        "doubleValue" => payload
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| malformed("doubleValue", payload.to_string())),
        "stringValue" | "timestampValue" | "referenceValue" => payload
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| malformed("stringValue", payload.to_string())),
        "arrayValue" => {
            let values = match payload.get("values") {
                None => return Ok(Value::Array(Vec::new())),
                Some(Value::Array(values)) => values,
                Some(other) => return Err(malformed("arrayValue", other.to_string())),
            };
            values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => match payload.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(malformed("mapValue", other.to_string())),
        },
        other => Err(ValueError::UnknownKind(other.to_owned())),
    }
}

// Integers travel as decimal strings to survive 64-bit precision loss.
fn decode_integer(payload: &Value) -> Result<Value, ValueError> {
    let parsed = match payload {
        Value::String(text) => text.parse::<i64>().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    };
    parsed
        .map(|n| Value::Number(n.into()))
        .ok_or_else(|| malformed("integerValue", payload.to_string()))
}

/// Encode a plain JSON object as a document `fields` object.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Encode one plain JSON value as a typed value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    let (kind, payload) = match value {
        Value::Null => ("nullValue", Value::Null),
        Value::Bool(b) => ("booleanValue", Value::Bool(*b)),
        Value::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(n), _) => ("integerValue", Value::String(n.to_string())),
            (None, Some(n)) => ("integerValue", Value::String(n.to_string())),
            (None, None) => ("doubleValue", value.clone()),
        },
        Value::String(s) => ("stringValue", Value::String(s.clone())),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            ("arrayValue", serde_json::json!({ "values": values }))
        }
        Value::Object(fields) => (
            "mapValue",
            serde_json::json!({ "fields": encode_fields(fields) }),
        ),
    };

    let mut wrapper = Map::with_capacity(1);
    wrapper.insert(kind.to_owned(), payload);
    Value::Object(wrapper)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_nested_product_fields() {
        let fields = json!({
            "name": {"stringValue": "Top X"},
            "price": {"doubleValue": 15.5},
            "active": {"booleanValue": true},
            "images": {"arrayValue": {"values": [{"stringValue": "a.jpg"}]}},
            "colors": {"mapValue": {"fields": {
                "Azul": {"mapValue": {"fields": {
                    "code": {"stringValue": "#0000ff"},
                    "stock": {"integerValue": "5"}
                }}}
            }}},
            "createdAt": {"timestampValue": "2024-01-02T03:04:05Z"}
        });

        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({
                "name": "Top X",
                "price": 15.5,
                "active": true,
                "images": ["a.jpg"],
                "colors": {"Azul": {"code": "#0000ff", "stock": 5}},
                "createdAt": "2024-01-02T03:04:05Z"
            })
        );
    }

    #[test]
    fn test_empty_array_and_map_have_no_payload() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})).unwrap(), json!({}));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = decode_value(&json!({"geoPointValue": {"latitude": 1.0}})).unwrap_err();
        assert_eq!(err, ValueError::UnknownKind("geoPointValue".to_owned()));
    }

    #[test]
    fn test_malformed_integer_is_rejected() {
        assert!(matches!(
            decode_value(&json!({"integerValue": "five"})),
            Err(ValueError::Malformed { kind: "integerValue", .. })
        ));
    }

    #[test]
    fn test_encode_uses_string_integers() {
        assert_eq!(encode_value(&json!(7)), json!({"integerValue": "7"}));
        assert_eq!(encode_value(&json!(7.25)), json!({"doubleValue": 7.25}));
        assert_eq!(
            encode_value(&json!({"stock": 3})),
            json!({"mapValue": {"fields": {"stock": {"integerValue": "3"}}}})
        );
    }

    #[test]
    fn test_encoded_document_decodes_back() {
        let plain = json!({"name": "Short Y", "active": false, "images": [], "tags": ["a", null]});
        let encoded = encode_fields(plain.as_object().unwrap());
        assert_eq!(Value::Object(decode_fields(&encoded).unwrap()), plain);
    }
}
