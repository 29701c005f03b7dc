//! Codec Resolution Tests
//!
//! Tier order is path > name > type > guard > built-in default, whatever
//! order the codecs were registered in.

use crate::common::*;
use dataapi_core::{PathPattern, TypeTag, Value};
use dataapi_serdes::{Codec, DesAction, SerAction, Universe};
use serde_json::json;

// ============================================================================
// Doubling age codec
// ============================================================================

#[test]
fn name_codec_doubles_age_in_documents() {
    let engine = engine(Universe::Documents, registry(vec![doubling("age")]));

    let wire = engine
        .serialize(&Value::object([("age", Value::Int(21))]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"age": 42}));

    let host = engine.deserialize_record(&json!({"age": 42}), None).unwrap();
    assert_eq!(host, Value::object([("age", Value::Int(21))]));
}

#[test]
fn name_codec_doubles_age_in_tables() {
    let engine = engine(Universe::Tables, registry(vec![doubling("age")]));
    let schema = projection(json!({"projectionSchema": {"age": {"type": "int"}}}));

    let host = engine
        .deserialize_record(&json!({"age": 42}), Some(&schema))
        .unwrap();
    assert_eq!(host, Value::object([("age", Value::Int(21))]));
}

// ============================================================================
// Tier order
// ============================================================================

#[test]
fn name_beats_type_in_either_registration_order() {
    let orders: [Vec<Codec>; 2] = [
        vec![
            marker(Codec::for_type(TypeTag::Int), "type"),
            marker(Codec::for_name("age"), "name"),
        ],
        vec![
            marker(Codec::for_name("age"), "name"),
            marker(Codec::for_type(TypeTag::Int), "type"),
        ],
    ];
    for codecs in orders {
        let engine = engine(Universe::Documents, registry(codecs));
        let wire = engine
            .serialize(&Value::object([("age", Value::Int(1)), ("other", Value::Int(2))]))
            .unwrap()
            .wire;
        assert_eq!(wire, json!({"age": "name", "other": "type"}));
    }
}

#[test]
fn every_tier_permutation_resolves_the_same() {
    let build = |order: &[usize]| {
        let all = [
            marker(Codec::for_path(PathPattern::parse(["a", "x"])), "path"),
            marker(Codec::for_name("x"), "name"),
            marker(Codec::for_type(TypeTag::Int), "type"),
            marker(Codec::custom().ser_guard(|v, _| v.as_str().is_some()), "guard"),
        ];
        order.iter().map(|&i| all[i].clone()).collect::<Vec<_>>()
    };
    let doc = Value::object([
        ("a", Value::object([("x", Value::Int(1))])),
        ("x", Value::Int(1)),
        ("n", Value::Int(1)),
        ("s", Value::from("seven")),
    ]);
    let expected = json!({"a": {"x": "path"}, "x": "name", "n": "type", "s": "guard"});

    for order in [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]] {
        let engine = engine(Universe::Documents, registry(build(&order)));
        assert_eq!(engine.serialize(&doc).unwrap().wire, expected, "order {:?}", order);
    }
}

#[test]
fn guard_runs_before_default() {
    let codec = Codec::custom()
        .ser_guard(|v, _| matches!(v, Value::String(s) if s.starts_with("secret:")))
        .serialize(|_, _| Ok(SerAction::Done(json!("***"))));
    let engine = engine(Universe::Documents, registry(vec![codec]));

    let wire = engine
        .serialize(&Value::object([
            ("a", Value::from("secret:1")),
            ("b", Value::from("public")),
        ]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"a": "***", "b": "public"}));
}

#[test]
fn first_non_declining_guard_wins() {
    let declining = Codec::custom().serialize(|_, _| Ok(SerAction::Decline));
    let first = Codec::custom().serialize(|v, _| match v {
        Value::Int(_) => Ok(SerAction::Done(json!("first"))),
        _ => Ok(SerAction::Decline),
    });
    let second = Codec::custom().serialize(|v, _| match v {
        Value::Int(_) => Ok(SerAction::Done(json!("second"))),
        _ => Ok(SerAction::Decline),
    });
    let engine = engine(Universe::Documents, registry(vec![declining, first, second]));

    let wire = engine
        .serialize(&Value::object([("n", Value::Int(1))]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"n": "first"}));
}

#[test]
fn continue_substitutes_then_uses_default() {
    let wrap = Codec::for_name("wrapped").serialize(|v, _| {
        Ok(SerAction::Continue(Value::Array(vec![v.clone(), v.clone()])))
    });
    let never = marker(Codec::for_type(TypeTag::Array), "type");
    let engine = engine(Universe::Documents, registry(vec![wrap, never]));

    let wire = engine
        .serialize(&Value::object([("wrapped", Value::Int(3))]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"wrapped": [3, 3]}));
}

#[test]
fn name_codec_matches_root_as_empty_name() {
    let root = Codec::for_name("").serialize(|v, _| match v {
        Value::Object(fields) => Ok(SerAction::Done(json!({"count": fields.len()}))),
        _ => Ok(SerAction::Decline),
    });
    let engine = engine(Universe::Documents, registry(vec![root]));
    let wire = engine
        .serialize(&Value::object([("a", Value::Int(1)), ("b", Value::Int(2))]))
        .unwrap()
        .wire;
    assert_eq!(wire, json!({"count": 2}));
}

#[test]
fn document_sigil_type_codec_on_deserialize() {
    let codec = Codec::for_wire_type("$date")
        .deserialize(|wire, _| Ok(DesAction::Done(Value::from(wire.to_string()))));
    let engine = engine(Universe::Documents, registry(vec![codec]));
    let host = engine
        .deserialize_record(&json!({"when": {"$date": 0}}), None)
        .unwrap();
    assert_eq!(host.get("when"), Some(&Value::from("{\"$date\":0}")));
}

#[test]
fn codec_errors_propagate() {
    let failing = Codec::for_name("bad").serialize(|_, _| {
        Err(dataapi_core::Error::codec("bad", "refused"))
    });
    let engine = engine(Universe::Documents, registry(vec![failing]));
    let err = engine
        .serialize(&Value::object([("bad", Value::Null)]))
        .unwrap_err();
    assert!(err.to_string().contains("refused"));
}
