//! Big Number Tests
//!
//! Serialization reports whether any big number was written; extended
//! numeric mode keeps them exact on the way back.

use std::str::FromStr;

use crate::common::*;
use dataapi_core::{BigDecimal, BigInt, Value};
use dataapi_serdes::{CodecRegistry, SerDes, SerDesOptions, Universe};
use serde_json::json;

fn extended(universe: Universe) -> SerDes {
    SerDes::new(
        universe,
        CodecRegistry::empty(),
        SerDesOptions {
            enable_big_numbers: true,
            ..Default::default()
        },
    )
}

fn huge() -> BigInt {
    BigInt::from_str("123456789012345678901234567890").unwrap()
}

#[test]
fn flag_is_false_without_big_numbers() {
    let out = plain(Universe::Documents)
        .serialize(&Value::object([("n", Value::Int(1)), ("f", Value::Float(0.5))]))
        .unwrap();
    assert!(!out.big_numbers);
}

#[test]
fn flag_is_set_by_a_deeply_nested_big_number() {
    let doc = Value::object([(
        "outer",
        Value::Array(vec![Value::Null, Value::object([("big", Value::BigInt(huge()))])]),
    )]);
    let out = plain(Universe::Documents).serialize(&doc).unwrap();
    assert!(out.big_numbers);
    assert_eq!(out.wire["outer"][1]["big"].to_string(), "123456789012345678901234567890");
}

#[test]
fn decimal_sets_flag_in_tables() {
    let dec = BigDecimal::from_str("0.10000000000000000000000001").unwrap();
    let out = plain(Universe::Tables)
        .serialize(&Value::object([("d", Value::Decimal(dec))]))
        .unwrap();
    assert!(out.big_numbers);
}

#[test]
fn extended_mode_keeps_big_integers_exact() {
    let wire: serde_json::Value =
        serde_json::from_str(r#"{"n": 123456789012345678901234567890, "small": 5}"#).unwrap();
    let doc = extended(Universe::Documents)
        .deserialize_record(&wire, None)
        .unwrap();
    assert_eq!(doc.get("n"), Some(&Value::BigInt(huge())));
    assert_eq!(doc.get("small"), Some(&Value::Int(5)));
}

#[test]
fn standard_mode_falls_back_to_float() {
    let wire: serde_json::Value =
        serde_json::from_str(r#"{"n": 123456789012345678901234567890}"#).unwrap();
    let doc = plain(Universe::Documents).deserialize_record(&wire, None).unwrap();
    assert!(matches!(doc.get("n"), Some(Value::Float(_))));
}

#[test]
fn varint_and_decimal_columns_are_exact_in_any_mode() {
    let schema = projection(json!({
        "projectionSchema": {"v": {"type": "varint"}, "d": {"type": "decimal"}}
    }));
    let wire: serde_json::Value =
        serde_json::from_str(r#"{"v": 123456789012345678901234567890, "d": 1.25}"#).unwrap();
    let row = plain(Universe::Tables)
        .deserialize_record(&wire, Some(&schema))
        .unwrap();
    assert_eq!(row.get("v"), Some(&Value::BigInt(huge())));
    assert_eq!(
        row.get("d"),
        Some(&Value::Decimal(BigDecimal::from_str("1.25").unwrap()))
    );
}
