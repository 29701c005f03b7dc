//! Built-in codecs
//!
//! These run after every user tier has declined. They cover the leaf
//! types of the value model; containers are walked by the engine, which
//! calls back in here for each leaf.

pub(crate) mod documents;
pub(crate) mod tables;

use dataapi_core::{DataApiVector, Error, Result, Value, ValuePath};

use crate::context::SerCtx;
use crate::wire::{self, WireValue};

/// Encodings shared by both universes. Returns `None` for the types whose
/// wire form depends on the universe.
pub(crate) fn encode_common(value: &Value, ctx: &mut SerCtx) -> Result<Option<WireValue>> {
    let wire = match value {
        Value::Null => WireValue::Null,
        Value::Bool(b) => WireValue::Bool(*b),
        Value::Int(i) => WireValue::from(*i),
        Value::Float(f) => wire::float_to_wire(*f),
        Value::BigInt(big) => {
            ctx.mark_big_number();
            wire::bigint_to_wire(big)?
        }
        Value::Decimal(dec) => {
            ctx.mark_big_number();
            wire::decimal_to_wire(dec)?
        }
        Value::String(s) => WireValue::String(s.clone()),
        Value::Blob(bytes) => wire::binary_to_wire(bytes),
        _ => return Ok(None),
    };
    Ok(Some(wire))
}

/// Encode an embedding as a number array or a packed binary
pub(crate) fn encode_vector(vector: &DataApiVector, binary: bool) -> WireValue {
    if binary {
        wire::binary_to_wire(&vector.to_be_bytes())
    } else {
        WireValue::Array(vector.as_slice().iter().map(|f| wire::f32_to_wire(*f)).collect())
    }
}

/// Decode an embedding from a number array or `{"$binary": ...}`
pub(crate) fn decode_vector(value: &WireValue, path: &ValuePath) -> Result<DataApiVector> {
    match value {
        WireValue::Array(items) => items
            .iter()
            .map(|item| decode_f64(item, path).map(|f| f as f32))
            .collect::<Result<Vec<f32>>>()
            .map(DataApiVector::new),
        other => match wire::as_sigil(other) {
            Some((wire::BINARY, WireValue::String(encoded))) => {
                DataApiVector::from_be_bytes(&wire::base64_decode(encoded, path)?)
            }
            _ => Err(Error::invalid_wire(
                path.to_string(),
                "number array or $binary",
                wire::kind(other),
            )),
        },
    }
}

/// Decode a float, accepting the non-finite sentinel strings
pub(crate) fn decode_f64(value: &WireValue, path: &ValuePath) -> Result<f64> {
    match value {
        WireValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::invalid_wire(path.to_string(), "float", n.to_string())),
        WireValue::String(s) => wire::special_float_from_str(s)
            .ok_or_else(|| Error::parse("Float", s.clone(), "not a number or sentinel")),
        other => Err(Error::invalid_wire(path.to_string(), "float", wire::kind(other))),
    }
}

/// Decode `{"$binary": "<base64>"}`
pub(crate) fn decode_blob(value: &WireValue, path: &ValuePath) -> Result<Vec<u8>> {
    match wire::as_sigil(value) {
        Some((wire::BINARY, WireValue::String(encoded))) => wire::base64_decode(encoded, path),
        _ => Err(Error::invalid_wire(path.to_string(), "$binary", wire::kind(value))),
    }
}

/// Require a string payload
pub(crate) fn expect_str<'w>(value: &'w WireValue, path: &ValuePath, expected: &str) -> Result<&'w str> {
    value
        .as_str()
        .ok_or_else(|| Error::invalid_wire(path.to_string(), expected, wire::kind(value)))
}
