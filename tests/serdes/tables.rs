//! Tables Universe Tests
//!
//! Schema-driven row decoding, sparse population and primary keys.

use crate::common::*;
use dataapi_core::chrono::{NaiveDate, TimeZone, Utc};
use dataapi_core::{DataApiVector, Error, TypeTag, Uuid, Value};
use dataapi_serdes::{
    Codec, CodecRegistry, DesAction, ResponseSchema, SerAction, SerDes, SerDesOptions, Universe,
};
use serde_json::json;

fn tables() -> SerDes {
    plain(Universe::Tables)
}

fn tags_schema() -> ResponseSchema {
    projection(json!({
        "projectionSchema": {
            "id": {"type": "int"},
            "tags": {"type": "set", "valueType": "text"}
        }
    }))
}

// ============================================================================
// Sparse rows
// ============================================================================

#[test]
fn absent_set_column_becomes_empty_set() {
    let row = tables()
        .deserialize_record(&json!({"id": 1}), Some(&tags_schema()))
        .unwrap();
    assert_eq!(
        row,
        Value::object([("id", Value::Int(1)), ("tags", Value::Set(vec![]))])
    );
}

#[test]
fn absent_scalar_and_map_columns() {
    let schema = projection(json!({
        "projectionSchema": {
            "name": {"type": "text"},
            "attrs": {"type": "map", "keyType": "text", "valueType": "int"},
            "items": {"type": "list", "valueType": "int"}
        }
    }));
    let row = tables().deserialize_record(&json!({}), Some(&schema)).unwrap();
    assert_eq!(row.get("name"), Some(&Value::Null));
    assert_eq!(row.get("attrs"), Some(&Value::Map(vec![])));
    assert_eq!(row.get("items"), Some(&Value::Array(vec![])));
}

#[test]
fn sparse_mode_leaves_absent_columns_out() {
    let engine = SerDes::tables(
        CodecRegistry::empty(),
        SerDesOptions {
            sparse_data: true,
            ..Default::default()
        },
    );
    let row = engine
        .deserialize_record(&json!({"id": 1}), Some(&tags_schema()))
        .unwrap();
    assert_eq!(row, Value::object([("id", Value::Int(1))]));
}

#[test]
fn populated_columns_reach_codecs() {
    let codec = Codec::for_name("tags").deserialize(|wire, _| match wire.as_array() {
        Some(items) if items.is_empty() => Ok(DesAction::Done(Value::from("none"))),
        _ => Ok(DesAction::Decline),
    });
    let engine = engine(Universe::Tables, registry(vec![codec]));
    let row = engine
        .deserialize_record(&json!({"id": 1}), Some(&tags_schema()))
        .unwrap();
    assert_eq!(row.get("tags"), Some(&Value::from("none")));
}

#[test]
fn deserialize_is_repeatable_and_leaves_input_alone() {
    let raw = json!({"id": 3});
    let before = raw.clone();
    let engine = tables();
    let first = engine.deserialize_record(&raw, Some(&tags_schema())).unwrap();
    let second = engine.deserialize_record(&raw, Some(&tags_schema())).unwrap();
    assert_eq!(first, second);
    assert_eq!(raw, before);
}

// ============================================================================
// Typed columns
// ============================================================================

#[test]
fn typed_columns_decode_by_schema() {
    let id = Uuid::new_v4();
    let schema = projection(json!({
        "projectionSchema": {
            "id": {"type": "uuid"},
            "born": {"type": "date"},
            "seen": {"type": "timestamp"},
            "scores": {"type": "list", "valueType": "double"},
            "labels": {"type": "map", "keyType": "text", "valueType": "text"},
            "counts": {"type": "map", "keyType": "int", "valueType": "text"},
            "embedding": {"type": "vector", "dimension": 2}
        }
    }));
    let wire = json!({
        "id": id.to_string(),
        "born": "2024-01-02",
        "seen": "2024-01-02T03:04:05Z",
        "scores": [1.5, 2],
        "labels": {"k": "v"},
        "counts": [[1, "one"]],
        "embedding": [0.5, 0.25]
    });

    let row = tables().deserialize_record(&wire, Some(&schema)).unwrap();
    assert_eq!(row.get("id"), Some(&Value::Uuid(id)));
    assert_eq!(
        row.get("born"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
    );
    assert_eq!(
        row.get("seen"),
        Some(&Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()))
    );
    assert_eq!(
        row.get("scores"),
        Some(&Value::Array(vec![Value::Float(1.5), Value::Float(2.0)]))
    );
    assert_eq!(
        row.get("labels"),
        Some(&Value::Map(vec![(Value::from("k"), Value::from("v"))]))
    );
    assert_eq!(
        row.get("counts"),
        Some(&Value::Map(vec![(Value::Int(1), Value::from("one"))]))
    );
    assert_eq!(
        row.get("embedding"),
        Some(&Value::Vector(DataApiVector::from(vec![0.5, 0.25])))
    );
}

#[test]
fn typed_values_serialize_to_table_forms() {
    let row = Value::object([
        ("born", Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())),
        ("tags", Value::Set(vec![Value::from("a")])),
        ("counts", Value::Map(vec![(Value::Int(1), Value::from("one"))])),
        ("labels", Value::Map(vec![(Value::from("k"), Value::Int(2))])),
    ]);
    let wire = tables().serialize(&row).unwrap().wire;
    assert_eq!(
        wire,
        json!({
            "born": "2024-01-02",
            "tags": ["a"],
            "counts": [[1, "one"]],
            "labels": {"k": 2}
        })
    );
}

#[test]
fn unsupported_column_type_passes_through() {
    let schema = projection(json!({
        "projectionSchema": {"odd": {"type": "frozen<tuple>"}}
    }));
    let row = tables()
        .deserialize_record(&json!({"odd": [1, "x"]}), Some(&schema))
        .unwrap();
    assert_eq!(
        row.get("odd"),
        Some(&Value::Array(vec![Value::Int(1), Value::from("x")]))
    );
}

#[test]
fn type_tier_keys_on_declared_column_type() {
    let codec = Codec::for_wire_type("date")
        .deserialize(|wire, _| Ok(DesAction::Done(Value::from(format!("day {}", wire.as_str().unwrap_or(""))))));
    let engine = engine(Universe::Tables, registry(vec![codec]));
    let schema = projection(json!({
        "projectionSchema": {"born": {"type": "date"}, "note": {"type": "text"}}
    }));
    let row = engine
        .deserialize_record(&json!({"born": "2024-01-02", "note": "2024-01-02"}), Some(&schema))
        .unwrap();
    assert_eq!(row.get("born"), Some(&Value::from("day 2024-01-02")));
    assert_eq!(row.get("note"), Some(&Value::from("2024-01-02")));
}

#[test]
fn table_only_type_codec_applies_to_tables() {
    let codec = Codec::for_type(TypeTag::Set).serialize(|v, _| match v {
        Value::Set(items) => Ok(SerAction::Done(json!(items.len()))),
        _ => Ok(SerAction::Decline),
    });
    let mut builder = CodecRegistry::builder();
    builder.register(Universe::Tables, codec).unwrap();
    let engine = SerDes::tables(builder.build(), SerDesOptions::default());
    let wire = engine
        .serialize(&Value::object([("s", Value::Set(vec![Value::Int(1), Value::Int(2)]))]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"s": 2}));
}

// ============================================================================
// Primary keys and errors
// ============================================================================

#[test]
fn primary_key_tuple_becomes_object() {
    let schema = ResponseSchema::primary_key_from_status(Some(&json!({
        "primaryKeySchema": {"region": {"type": "text"}, "seq": {"type": "int"}}
    })))
    .unwrap();
    let key = tables()
        .deserialize_primary_key(&json!(["eu", 7]), &schema)
        .unwrap();
    assert_eq!(
        key,
        Value::object([("region", Value::from("eu")), ("seq", Value::Int(7))])
    );
}

#[test]
fn primary_key_arity_mismatch_is_rejected() {
    let schema = ResponseSchema::primary_key_from_status(Some(&json!({
        "primaryKeySchema": {"region": {"type": "text"}, "seq": {"type": "int"}}
    })))
    .unwrap();
    let err = tables()
        .deserialize_primary_key(&json!(["eu"]), &schema)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidWireValue { .. }));
}

#[test]
fn row_without_schema_is_rejected() {
    let err = tables().deserialize_record(&json!({"id": 1}), None).unwrap_err();
    assert!(matches!(err, Error::MissingSchema { .. }));
}

#[test]
fn wrong_wire_type_for_column_is_rejected() {
    let schema = projection(json!({"projectionSchema": {"n": {"type": "int"}}}));
    let err = tables()
        .deserialize_record(&json!({"n": "seven"}), Some(&schema))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidWireValue { .. }));
}
