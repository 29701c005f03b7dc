//! Wire-level encodings shared by both schema universes.
//!
//! | Host value | Wire representation |
//! |------|---------------------|
//! | Blob | `{"$binary": "<base64>"}` |
//! | Timestamp (documents) | `{"$date": <epoch millis>}` |
//! | Uuid (documents) | `{"$uuid": "<hyphenated>"}` |
//! | ObjectId (documents) | `{"$objectId": "<hex>"}` |
//! | NaN | `"NaN"` |
//! | +Infinity | `"Infinity"` |
//! | -Infinity | `"-Infinity"` |
//! | BigInt / Decimal | JSON number carrying every digit |
//!
//! These strings are a stable contract with the server.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bigdecimal::BigDecimal;
use dataapi_core::{Error, Result, Value, ValuePath};
use num_bigint::BigInt;
use serde_json::{Map, Number};

/// Wire representation of a document, row or command
pub type WireValue = serde_json::Value;

/// Sigil for binary payloads
pub const BINARY: &str = "$binary";
/// Sigil for document timestamps
pub const DATE: &str = "$date";
/// Sigil for document UUIDs
pub const UUID: &str = "$uuid";
/// Sigil for document object ids
pub const OBJECT_ID: &str = "$objectId";
/// Reserved document field holding the embedding
pub const VECTOR_FIELD: &str = "$vector";

/// Sentinel for NaN
pub const NAN: &str = "NaN";
/// Sentinel for positive infinity
pub const INFINITY: &str = "Infinity";
/// Sentinel for negative infinity
pub const NEG_INFINITY: &str = "-Infinity";

/// How plain JSON numbers are turned into host numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericMode {
    /// Integers that fit in i64 become `Int`, everything else `Float`
    #[default]
    Standard,
    /// Additionally keep out-of-range integers as `BigInt` and decimals
    /// that would lose digits as `Decimal`
    Extended,
}

/// Wrap a single sigil key/value pair into a wire object
pub fn sigil(key: &str, value: WireValue) -> WireValue {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    WireValue::Object(map)
}

/// Return the sigil key and its payload if `value` is a one-key object whose key starts with `$`
pub fn as_sigil(value: &WireValue) -> Option<(&str, &WireValue)> {
    match value {
        WireValue::Object(map) if map.len() == 1 => map
            .iter()
            .next()
            .filter(|(k, _)| k.starts_with('$'))
            .map(|(k, v)| (k.as_str(), v)),
        _ => None,
    }
}

/// Encode bytes as `{"$binary": "<base64>"}`
pub fn binary_to_wire(bytes: &[u8]) -> WireValue {
    sigil(BINARY, WireValue::String(BASE64.encode(bytes)))
}

/// Decode a base64 payload
pub fn base64_decode(encoded: &str, path: &ValuePath) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded)
        .map_err(|e| Error::invalid_wire(path.to_string(), "base64 string", e.to_string()))
}

/// Convert a float to its wire form, using sentinel strings for non-finite values.
pub fn float_to_wire(f: f64) -> WireValue {
    if f.is_nan() {
        WireValue::String(NAN.to_string())
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            WireValue::String(INFINITY.to_string())
        } else {
            WireValue::String(NEG_INFINITY.to_string())
        }
    } else {
        Number::from_f64(f)
            .map(WireValue::Number)
            .unwrap_or_else(|| WireValue::String(f.to_string()))
    }
}

/// Convert an embedding component, keeping its shortest decimal form.
pub fn f32_to_wire(f: f32) -> WireValue {
    if !f.is_finite() {
        return float_to_wire(f as f64);
    }
    number_from_literal(&f.to_string()).unwrap_or_else(|_| float_to_wire(f as f64))
}

/// Parse a sentinel string back into a float.
pub fn special_float_from_str(s: &str) -> Option<f64> {
    match s {
        NAN => Some(f64::NAN),
        INFINITY => Some(f64::INFINITY),
        NEG_INFINITY => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Write an arbitrary-precision number literal as a wire number.
fn number_from_literal(literal: &str) -> Result<WireValue> {
    serde_json::from_str::<Number>(literal)
        .map(WireValue::Number)
        .map_err(|e| Error::parse("number", literal, e))
}

/// Encode a big integer with every digit preserved
pub fn bigint_to_wire(value: &BigInt) -> Result<WireValue> {
    number_from_literal(&value.to_string())
}

/// Encode a decimal with every digit preserved
pub fn decimal_to_wire(value: &BigDecimal) -> Result<WireValue> {
    number_from_literal(&value.to_string())
}

/// Convert a wire number to a host number.
pub fn number_to_value(n: &Number, mode: NumericMode) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Int(i);
    }
    let literal = n.to_string();
    if mode == NumericMode::Extended {
        let is_integral = !literal.contains(['.', 'e', 'E']);
        if is_integral {
            if let Ok(big) = BigInt::from_str(&literal) {
                return Value::BigInt(big);
            }
        } else if let Ok(exact) = BigDecimal::from_str(&literal) {
            let lossless = n
                .as_f64()
                .and_then(|f| BigDecimal::from_str(&f.to_string()).ok())
                .is_some_and(|approx| approx == exact);
            if !lossless {
                return Value::Decimal(exact);
            }
        }
    }
    Value::Float(n.as_f64().unwrap_or(f64::NAN))
}

/// Interpret a wire number (or numeric string) as an exact big integer.
pub fn wire_to_bigint(value: &WireValue, path: &ValuePath) -> Result<BigInt> {
    let literal = match value {
        WireValue::Number(n) => n.to_string(),
        WireValue::String(s) => s.clone(),
        other => return Err(Error::invalid_wire(path.to_string(), "integer", kind(other))),
    };
    BigInt::from_str(&literal).map_err(|e| Error::parse("BigInt", literal, e))
}

/// Interpret a wire number (or numeric string) as an exact decimal.
pub fn wire_to_decimal(value: &WireValue, path: &ValuePath) -> Result<BigDecimal> {
    let literal = match value {
        WireValue::Number(n) => n.to_string(),
        WireValue::String(s) => s.clone(),
        other => return Err(Error::invalid_wire(path.to_string(), "decimal", kind(other))),
    };
    BigDecimal::from_str(&literal).map_err(|e| Error::parse("Decimal", literal, e))
}

/// Decode a standalone embedding such as a response's `sortVector`
pub fn vector_from_wire(value: &WireValue) -> Result<dataapi_core::DataApiVector> {
    crate::builtins::decode_vector(value, &ValuePath::root())
}

/// Short description of a wire value's shape, for error messages
pub fn kind(value: &WireValue) -> &'static str {
    match value {
        WireValue::Null => "null",
        WireValue::Bool(_) => "boolean",
        WireValue::Number(_) => "number",
        WireValue::String(_) => "string",
        WireValue::Array(_) => "array",
        WireValue::Object(_) => "object",
    }
}
