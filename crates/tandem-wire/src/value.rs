//! Structured (already decoded) wrapper chunks.
//!
//! Some transports hand over a chunk as a JSON object rather than raw
//! bytes. Numbers may arrive as floats; only integral, non-negative
//! values within the field's width are accepted.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::chunk::{header_is_consistent, WrapperChunk};

fn as_u64(value: &Value) -> Option<u64> {
    if let Some(v) = value.as_u64() {
        return Some(v);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn field_u32(obj: &Map<String, Value>, name: &str) -> Option<u32> {
    u32::try_from(as_u64(obj.get(name)?)?).ok()
}

/// Convert a loosely typed payload to bytes.
///
/// Accepts an array of integers in `0..=255`, a string (UTF-8 encoded),
/// or a serialized buffer object `{"type": "Buffer", "data": [...]}`.
/// Anything else yields `None`.
///
/// ```
/// use serde_json::json;
/// use tandem_wire::coerce_network_payload_to_bytes;
///
/// assert_eq!(coerce_network_payload_to_bytes(&json!([1, 2, 255])), Some(vec![1, 2, 255]));
/// assert_eq!(coerce_network_payload_to_bytes(&json!("hi")), Some(b"hi".to_vec()));
/// assert_eq!(coerce_network_payload_to_bytes(&json!([256])), None);
/// ```
pub fn coerce_network_payload_to_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| as_u64(item).and_then(|b| u8::try_from(b).ok()))
            .collect(),
        Value::String(s) => Some(s.as_bytes().to_vec()),
        Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some("Buffer") => {
            let data = obj.get("data")?;
            if data.is_array() {
                coerce_network_payload_to_bytes(data)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Parse a fragment from a structured object.
///
/// Fields: `wrappedCommandID`, `chunkNumber`, `numChunks`,
/// `totalDataLength`, `dataOffset`, payload under `data` or `chunkData`,
/// and an optional `dataLength` that must equal the decoded payload
/// length. The same structural rules as the binary path apply.
pub fn parse_wrapper_chunk_value(value: &Value) -> Option<WrapperChunk> {
    let obj = value.as_object()?;

    let wrapped_command_id = u16::try_from(as_u64(obj.get("wrappedCommandID")?)?).ok()?;
    let chunk_number = field_u32(obj, "chunkNumber")?;
    let num_chunks = field_u32(obj, "numChunks")?;
    let total_data_length = field_u32(obj, "totalDataLength")?;
    let data_offset = field_u32(obj, "dataOffset")?;

    let raw = obj.get("data").or_else(|| obj.get("chunkData"))?;
    let data = coerce_network_payload_to_bytes(raw)?;
    let data_length = u32::try_from(data.len()).ok()?;

    if obj.contains_key("dataLength") && field_u32(obj, "dataLength")? != data_length {
        tracing::trace!(wrapped_command_id, "structured chunk dataLength disagrees with payload");
        return None;
    }

    if !header_is_consistent(
        chunk_number,
        num_chunks,
        total_data_length,
        data_offset,
        data_length,
    ) {
        tracing::trace!(
            wrapped_command_id,
            chunk_number,
            num_chunks,
            total_data_length,
            data_offset,
            data_length,
            "rejected structured wrapper chunk"
        );
        return None;
    }

    Some(WrapperChunk {
        wrapped_command_id,
        chunk_number,
        num_chunks,
        total_data_length,
        data_offset,
        data: Bytes::from(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "wrappedCommandID": 9,
            "chunkNumber": 1,
            "numChunks": 2,
            "totalDataLength": 5,
            "dataOffset": 3,
            "data": [7, 8],
        })
    }

    #[test]
    fn parses_well_formed_object() {
        let chunk = parse_wrapper_chunk_value(&base()).unwrap();
        assert_eq!(chunk.wrapped_command_id, 9);
        assert_eq!(chunk.data.as_ref(), &[7, 8]);
        assert_eq!(chunk.data_length(), 2);
    }

    #[test]
    fn chunk_data_alias_and_buffer_object() {
        let mut v = base();
        let obj = v.as_object_mut().unwrap();
        obj.remove("data");
        obj.insert("chunkData".into(), json!({"type": "Buffer", "data": [7, 8]}));
        assert!(parse_wrapper_chunk_value(&v).is_some());
    }

    #[test]
    fn integral_floats_accepted() {
        let mut v = base();
        v["chunkNumber"] = json!(1.0);
        assert!(parse_wrapper_chunk_value(&v).is_some());
        v["chunkNumber"] = json!(1.5);
        assert!(parse_wrapper_chunk_value(&v).is_none());
    }

    #[test]
    fn negative_or_missing_fields_rejected() {
        let mut v = base();
        v["dataOffset"] = json!(-1);
        assert!(parse_wrapper_chunk_value(&v).is_none());

        let mut v = base();
        v.as_object_mut().unwrap().remove("numChunks");
        assert!(parse_wrapper_chunk_value(&v).is_none());

        let mut v = base();
        v["wrappedCommandID"] = json!(70_000);
        assert!(parse_wrapper_chunk_value(&v).is_none());
    }

    #[test]
    fn explicit_data_length_must_agree() {
        let mut v = base();
        v["dataLength"] = json!(2);
        assert!(parse_wrapper_chunk_value(&v).is_some());
        v["dataLength"] = json!(3);
        assert!(parse_wrapper_chunk_value(&v).is_none());
        v["dataLength"] = json!("2");
        assert!(parse_wrapper_chunk_value(&v).is_none());
    }

    #[test]
    fn empty_message_requires_zeroed_fields() {
        let v = json!({
            "wrappedCommandID": 1, "chunkNumber": 0, "numChunks": 0,
            "totalDataLength": 0, "dataOffset": 0, "data": [],
        });
        assert!(parse_wrapper_chunk_value(&v).unwrap().is_empty_message());

        let v = json!({
            "wrappedCommandID": 1, "chunkNumber": 2, "numChunks": 0,
            "totalDataLength": 0, "dataOffset": 0, "data": [],
        });
        assert!(parse_wrapper_chunk_value(&v).is_none());
    }

    #[test]
    fn coercion_rejects_other_shapes() {
        assert_eq!(coerce_network_payload_to_bytes(&json!(null)), None);
        assert_eq!(coerce_network_payload_to_bytes(&json!(12)), None);
        assert_eq!(coerce_network_payload_to_bytes(&json!({"data": [1]})), None);
        assert_eq!(coerce_network_payload_to_bytes(&json!([1, "2"])), None);
        assert_eq!(coerce_network_payload_to_bytes(&json!([-1])), None);
    }
}
