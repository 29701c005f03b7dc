//! Documents universe leaf codecs (sigil encodings)

use chrono::{DateTime, TimeZone, Utc};
use dataapi_core::{Error, ObjectId, PathSegment, Result, Uuid, Value, ValuePath};

use super::{encode_common, encode_vector, expect_str};
use crate::context::SerCtx;
use crate::wire::{self, WireValue};

/// Encode a leaf value of a document
pub(crate) fn encode(value: &Value, ctx: &mut SerCtx, binary_vectors: bool) -> Result<WireValue> {
    if let Some(err) = value.type_tag().table_only_error() {
        return Err(err);
    }
    if let Some(wire) = encode_common(value, ctx)? {
        return Ok(wire);
    }
    let wire = match value {
        Value::Timestamp(ts) => wire::sigil(wire::DATE, WireValue::from(ts.timestamp_millis())),
        Value::Uuid(id) => wire::sigil(wire::UUID, WireValue::String(id.hyphenated().to_string())),
        Value::ObjectId(id) => wire::sigil(wire::OBJECT_ID, WireValue::String(id.to_string())),
        Value::Vector(v) => encode_vector(v, binary_vectors),
        other => {
            return Err(Error::codec(
                ctx.path().to_string(),
                format!("{} is not a leaf value", other.type_name()),
            ))
        }
    };
    Ok(wire)
}

/// Check if `path` is the reserved top-level embedding field
pub(crate) fn is_vector_field(path: &ValuePath) -> bool {
    matches!(path.segments(), [PathSegment::Key(k)] if k == wire::VECTOR_FIELD)
}

/// Decode a recognised sigil object. Returns `None` for `$`-keyed objects
/// that are not sigils (operators, user data).
pub(crate) fn decode_sigil(key: &str, payload: &WireValue, path: &ValuePath) -> Result<Option<Value>> {
    let value = match key {
        wire::DATE => Value::Timestamp(decode_date(payload, path)?),
        wire::UUID => {
            let s = expect_str(payload, path, "uuid string")?;
            Value::Uuid(Uuid::parse_str(s).map_err(|e| Error::parse("Uuid", s, e))?)
        }
        wire::OBJECT_ID => {
            let s = expect_str(payload, path, "objectId hex string")?;
            Value::ObjectId(s.parse::<ObjectId>()?)
        }
        wire::BINARY => {
            let encoded = expect_str(payload, path, "base64 string")?;
            Value::Blob(wire::base64_decode(encoded, path)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn decode_date(payload: &WireValue, path: &ValuePath) -> Result<DateTime<Utc>> {
    match payload {
        WireValue::Number(n) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| Error::invalid_wire(path.to_string(), "epoch millis", n.to_string()))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| Error::parse("Timestamp", millis.to_string(), "out of range"))
        }
        WireValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::parse("Timestamp", s.clone(), e)),
        other => Err(Error::invalid_wire(path.to_string(), "epoch millis", wire::kind(other))),
    }
}
