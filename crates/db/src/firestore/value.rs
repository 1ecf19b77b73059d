//! Conversion between Firestore typed values and plain JSON.

use imagegate_core::metadata::UploadRecord;
use serde_json::{Map, Value, json};

/// Encode a record as a Firestore `fields` object.
pub(crate) fn encode_record(record: &UploadRecord) -> Value {
    json!({
        "filename": { "stringValue": record.original_filename },
        "url": { "stringValue": record.public_url },
        "b2_filename": { "stringValue": record.object_key },
        "timestamp": { "stringValue": record.timestamp },
    })
}

/// Flatten a Firestore `fields` object into plain JSON values.
pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" | "booleanValue"
        | "doubleValue" => inner.clone(),
        // 64-bit integers travel as strings.
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map_or_else(|| inner.clone(), Value::from),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map_or_else(|| Value::Object(Map::new()), |f| Value::Object(decode_fields(f))),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}
