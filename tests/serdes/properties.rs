//! Property tests for document round trips and key renaming

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::*;
use dataapi_core::Value;
use dataapi_serdes::{CamelToSnakeCase, Universe};
use proptest::prelude::*;

fn camel_key() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}"
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[ -~]{0,12}".prop_map(Value::String),
    ]
}

fn document_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map(camel_key(), inner, 0..4).prop_map(Value::Object),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::hash_map(camel_key(), document_value(), 0..5)
        .prop_map(|fields: HashMap<String, Value>| Value::Object(fields))
}

proptest! {
    #[test]
    fn documents_round_trip(doc in document()) {
        let engine = plain(Universe::Documents);
        let wire = engine.serialize(&doc).unwrap().wire;
        prop_assert_eq!(engine.deserialize_record(&wire, None).unwrap(), doc);
    }

    #[test]
    fn snake_case_round_trips_through_engine(doc in document()) {
        let engine = plain(Universe::Documents)
            .with_key_transformer(Arc::new(CamelToSnakeCase::new(true, true)));
        let wire = engine.serialize(&doc).unwrap().wire;
        prop_assert_eq!(engine.deserialize_record(&wire, None).unwrap(), doc);
    }

    #[test]
    fn snake_case_wire_keys_have_no_uppercase(doc in document()) {
        let engine = plain(Universe::Documents)
            .with_key_transformer(Arc::new(CamelToSnakeCase::new(true, true)));
        let wire = engine.serialize(&doc).unwrap().wire;
        if let Some(fields) = wire.as_object() {
            for key in fields.keys() {
                prop_assert!(!key.chars().any(|c| c.is_ascii_uppercase()), "key {}", key);
            }
        }
    }
}
