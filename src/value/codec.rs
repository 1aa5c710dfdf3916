//! Value codec
//!
//! Encoding and decoding functions for tagged payloads.
//!
//! Scalars are stored as text so payloads stay readable with a hex dump;
//! dict/list/tuple bodies are compact JSON.

use crate::error::{Result, TagKvError};

use super::{Tag, Value, ValueType};

/// Header size: 1 byte tag + 1 byte ':' separator
pub const TAG_HEADER_SIZE: usize = 2;

const TAG_SEPARATOR: u8 = b':';

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to tagged bytes
///
/// Format: tag (1) + ':' (1) + body
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let (tag, body) = match value {
        Value::Int(n) => (Tag::Int, n.to_string().into_bytes()),
        Value::Bool(b) => (Tag::Int, if *b { b"1".to_vec() } else { b"0".to_vec() }),
        Value::Float(f) => (Tag::Float, format!("{:?}", f).into_bytes()),
        Value::Str(s) => (Tag::Str, s.as_bytes().to_vec()),
        Value::Dict(_) => (Tag::Dict, encode_structured(value)?),
        Value::List(_) => (Tag::List, encode_structured(value)?),
        Value::Tuple(_) => (Tag::Tuple, encode_structured(value)?),
        Value::Null => {
            return Err(TagKvError::UnsupportedType(
                "null has no storage tag".to_string(),
            ))
        }
    };

    let mut payload = Vec::with_capacity(TAG_HEADER_SIZE + body.len());
    payload.push(tag as u8);
    payload.push(TAG_SEPARATOR);
    payload.extend_from_slice(&body);

    Ok(payload)
}

fn encode_structured(value: &Value) -> Result<Vec<u8>> {
    let json = value.to_json()?;
    serde_json::to_vec(&json).map_err(|e| TagKvError::UnsupportedType(e.to_string()))
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode tagged bytes to a value
///
/// Any malformed payload is reported as `TagKvError::Decode`.
pub fn decode(payload: &[u8]) -> Result<Value> {
    if payload.len() < TAG_HEADER_SIZE || payload[1] != TAG_SEPARATOR {
        return Err(TagKvError::Decode(format!(
            "Invalid encoded value: missing tag header ({} bytes)",
            payload.len()
        )));
    }

    let tag = Tag::from_byte(payload[0]).ok_or_else(|| {
        TagKvError::Decode(format!("Unknown type tag: 0x{:02x}", payload[0]))
    })?;
    let body = &payload[TAG_HEADER_SIZE..];

    match tag {
        Tag::Int => {
            let text = body_text(tag, body)?;
            text.trim().parse::<i64>().map(Value::Int).map_err(|e| {
                TagKvError::Decode(format!("INT payload {:?}: {}", text, e))
            })
        }
        Tag::Float => {
            let text = body_text(tag, body)?;
            text.trim().parse::<f64>().map(Value::Float).map_err(|e| {
                TagKvError::Decode(format!("FLOAT payload {:?}: {}", text, e))
            })
        }
        Tag::Str => body_text(tag, body).map(|s| Value::Str(s.to_string())),
        Tag::Dict => match decode_structured(body)? {
            serde_json::Value::Object(object) => Ok(Value::from(serde_json::Value::Object(object))),
            other => Err(shape_error(tag, &other)),
        },
        Tag::List => match decode_structured(body)? {
            serde_json::Value::Array(items) => {
                Ok(Value::List(items.into_iter().map(Value::from).collect()))
            }
            other => Err(shape_error(tag, &other)),
        },
        Tag::Tuple => match decode_structured(body)? {
            serde_json::Value::Array(items) => {
                Ok(Value::Tuple(items.into_iter().map(Value::from).collect()))
            }
            other => Err(shape_error(tag, &other)),
        },
    }
}

/// Decode tagged bytes and require a specific native type
pub fn decode_typed(payload: &[u8], expected: ValueType) -> Result<Value> {
    let value = decode(payload)?;
    let actual = value.value_type();
    if actual != expected {
        return Err(TagKvError::TypeMismatch { expected, actual });
    }
    Ok(value)
}

fn body_text(tag: Tag, body: &[u8]) -> Result<&str> {
    std::str::from_utf8(body)
        .map_err(|e| TagKvError::Decode(format!("{:?} payload is not UTF-8: {}", tag, e)))
}

fn decode_structured(body: &[u8]) -> Result<serde_json::Value> {
    Ok(serde_json::from_slice(body)?)
}

fn shape_error(tag: Tag, json: &serde_json::Value) -> TagKvError {
    let found = match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    };
    TagKvError::Decode(format!("{:?} payload holds a JSON {}", tag, found))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout() {
        assert_eq!(encode(&Value::Int(42)).unwrap(), b"i:42".to_vec());
        assert_eq!(encode(&Value::Float(235.0)).unwrap(), b"f:235.0".to_vec());
        assert_eq!(encode(&Value::from("SI")).unwrap(), b"s:SI".to_vec());
        assert_eq!(encode(&Value::Bool(true)).unwrap(), b"i:1".to_vec());
        assert_eq!(
            encode(&Value::Tuple(vec![Value::Int(1), Value::Int(2)])).unwrap(),
            b"t:[1,2]".to_vec()
        );
    }

    #[test]
    fn test_reads_legacy_float_text() {
        // Float bodies written without a decimal point still parse
        assert_eq!(decode(b"f:235").unwrap(), Value::Float(235.0));
        assert_eq!(decode(b"f:1e-05").unwrap(), Value::Float(1e-5));
    }
}
