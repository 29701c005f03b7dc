//! Tables universe leaf codecs (column-typed encodings)

use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use dataapi_core::{DataApiDuration, Error, Result, Uuid, Value, ValuePath};

use super::{decode_blob, decode_f64, encode_common, encode_vector, expect_str};
use crate::context::SerCtx;
use crate::schema::ScalarType;
use crate::wire::{self, NumericMode, WireValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Encode a leaf value of a row
pub(crate) fn encode(value: &Value, ctx: &mut SerCtx, binary_vectors: bool) -> Result<WireValue> {
    if let Some(wire) = encode_common(value, ctx)? {
        return Ok(wire);
    }
    let text = match value {
        Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        Value::Time(t) => t.format(TIME_FORMAT).to_string(),
        Value::Duration(d) => d.to_string(),
        Value::Uuid(id) => id.hyphenated().to_string(),
        Value::ObjectId(id) => id.to_string(),
        Value::Inet(ip) => ip.to_string(),
        Value::Vector(v) => return Ok(encode_vector(v, binary_vectors)),
        other => {
            return Err(Error::codec(
                ctx.path().to_string(),
                format!("{} is not a leaf value", other.type_name()),
            ))
        }
    };
    Ok(WireValue::String(text))
}

/// Decode a scalar column value. `null` has already been handled.
pub(crate) fn decode_scalar(
    scalar: ScalarType,
    value: &WireValue,
    path: &ValuePath,
    mode: NumericMode,
) -> Result<Value> {
    let decoded = match scalar {
        ScalarType::Ascii | ScalarType::Text | ScalarType::Varchar => {
            Value::String(expect_str(value, path, scalar.name())?.to_string())
        }
        ScalarType::Boolean => Value::Bool(
            value
                .as_bool()
                .ok_or_else(|| Error::invalid_wire(path.to_string(), "boolean", wire::kind(value)))?,
        ),
        ScalarType::Int
        | ScalarType::Smallint
        | ScalarType::Tinyint
        | ScalarType::Bigint
        | ScalarType::Counter => match value {
            WireValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => wire::number_to_value(n, mode),
            },
            other => return Err(Error::invalid_wire(path.to_string(), scalar.name(), wire::kind(other))),
        },
        ScalarType::Varint => Value::BigInt(wire::wire_to_bigint(value, path)?),
        ScalarType::Decimal => Value::Decimal(wire::wire_to_decimal(value, path)?),
        ScalarType::Float | ScalarType::Double => Value::Float(decode_f64(value, path)?),
        ScalarType::Blob => Value::Blob(decode_blob(value, path)?),
        ScalarType::Uuid | ScalarType::Timeuuid => {
            let s = expect_str(value, path, "uuid string")?;
            Value::Uuid(Uuid::parse_str(s).map_err(|e| Error::parse("Uuid", s, e))?)
        }
        ScalarType::Timestamp => {
            let s = expect_str(value, path, "timestamp string")?;
            Value::Timestamp(
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| Error::parse("Timestamp", s, e))?,
            )
        }
        ScalarType::Date => {
            let s = expect_str(value, path, "date string")?;
            Value::Date(
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .map_err(|e| Error::parse("DataApiDate", s, e))?,
            )
        }
        ScalarType::Time => {
            let s = expect_str(value, path, "time string")?;
            Value::Time(
                NaiveTime::parse_from_str(s, TIME_FORMAT)
                    .map_err(|e| Error::parse("DataApiTime", s, e))?,
            )
        }
        ScalarType::Duration => {
            let s = expect_str(value, path, "duration string")?;
            Value::Duration(s.parse::<DataApiDuration>()?)
        }
        ScalarType::Inet => {
            let s = expect_str(value, path, "inet string")?;
            Value::Inet(s.parse::<IpAddr>().map_err(|e| Error::parse("DataApiInet", s, e))?)
        }
    };
    Ok(decoded)
}

/// Turn an object key of a `map<K, V>` column back into a wire value of type `K`
pub(crate) fn map_key_to_wire(key: &str, scalar: Option<ScalarType>) -> WireValue {
    match scalar {
        Some(s) if s.is_textual() => WireValue::String(key.to_string()),
        _ => serde_json::from_str::<WireValue>(key)
            .ok()
            .filter(|v| !v.is_string() && !v.is_object() && !v.is_array())
            .unwrap_or_else(|| WireValue::String(key.to_string())),
    }
}
