//! Conversion between plain JSON and Firestore's typed `Value` encoding.

use serde_json::{Map, Value, json};

use crate::error::AppError;

/// Encode a JSON value as a Firestore `Value`.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Decode a Firestore `Value` into plain JSON. Timestamps become RFC 3339
/// strings and geo points become `{latitude, longitude}` objects.
pub fn decode(value: &Value) -> Result<Value, AppError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(malformed(value));
    };

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().ok_or_else(|| malformed(value))?),
        "integerValue" => {
            let i = match inner {
                Value::String(s) => s.parse::<i64>().map_err(|_| malformed(value))?,
                Value::Number(n) => n.as_i64().ok_or_else(|| malformed(value))?,
                _ => return Err(malformed(value)),
            };
            Value::from(i)
        }
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            // NaN and the infinities have no JSON representation.
            _ => Value::Null,
        },
        "timestampValue" | "stringValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default(),
        ),
        _ => return Err(malformed(value)),
    })
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode(v)?)))
        .collect()
}

/// Quote a top-level field name for use in a field path.
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Last segment of a full document resource name.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn malformed(value: &Value) -> AppError {
    AppError::Internal(format!("Unrecognised Firestore value: {value}"))
}
