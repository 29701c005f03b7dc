//! Common test utilities for serdes tests

#![allow(dead_code)]

use std::sync::Arc;

use dataapi_core::Value;
use dataapi_serdes::{
    Codec, CodecRegistry, DesAction, ResponseSchema, SerAction, SerDes, SerDesOptions, Universe,
    WireValue,
};

/// Engine with no codecs and default options
pub fn plain(universe: Universe) -> SerDes {
    SerDes::new(universe, CodecRegistry::empty(), SerDesOptions::default())
}

/// Engine over `codecs` with default options
pub fn engine(universe: Universe, codecs: Arc<CodecRegistry>) -> SerDes {
    SerDes::new(universe, codecs, SerDesOptions::default())
}

/// Registry holding the same codecs in both universes
pub fn registry(codecs: Vec<Codec>) -> Arc<CodecRegistry> {
    let mut builder = CodecRegistry::builder();
    for codec in codecs {
        builder.register(Universe::Documents, codec.clone()).unwrap();
        builder.register(Universe::Tables, codec).unwrap();
    }
    builder.build()
}

/// Name codec that doubles an integer on the way out and halves it on the way in
pub fn doubling(name: &str) -> Codec {
    Codec::for_name(name)
        .serialize(|value, _| match value {
            Value::Int(i) => Ok(SerAction::Done(serde_json::json!(i * 2))),
            _ => Ok(SerAction::Decline),
        })
        .deserialize(|wire, _| match wire.as_i64() {
            Some(i) => Ok(DesAction::Done(Value::Int(i / 2))),
            None => Ok(DesAction::Decline),
        })
}

/// Codec answering every serialize call with a fixed marker
pub fn marker(codec: Codec, label: &'static str) -> Codec {
    codec.serialize(move |_, _| Ok(SerAction::Done(serde_json::json!(label))))
}

/// Projection schema from a `status` block
pub fn projection(status: WireValue) -> ResponseSchema {
    ResponseSchema::projection_from_status(Some(&status)).unwrap()
}
