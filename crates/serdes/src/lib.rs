//! Serialization engine for DataAPI documents and table rows
//!
//! This crate turns host [`Value`](dataapi_core::Value) trees into wire JSON
//! and back:
//! - [`CodecRegistry`]: user codecs indexed by path, name, type and guard
//! - [`SerDes`]: the traversal engine, one per universe
//! - [`KeyTransformer`]: key renaming between naming conventions
//! - [`ResponseSchema`]: column types reported by table responses
//! - [`wire`]: sigils and number encodings shared with the server
//!
//! ## Quick Start
//!
//! ```
//! use dataapi_core::Value;
//! use dataapi_serdes::{CodecRegistry, SerDes, SerDesOptions};
//!
//! let serdes = SerDes::documents(CodecRegistry::empty(), SerDesOptions::default());
//! let doc = Value::object([("name", Value::from("ada"))]);
//!
//! let out = serdes.serialize(&doc).unwrap();
//! assert_eq!(out.wire, serde_json::json!({"name": "ada"}));
//! assert!(!out.big_numbers);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builtins;
mod codec;
mod context;
mod engine;
mod key_transformer;
mod registry;
mod schema;
pub mod wire;

pub use codec::{
    Codec, DesAction, DesFn, DesGuard, MatchCriterion, SerAction, SerFn, SerGuard, Universe,
};
pub use context::{DesCtx, DesTarget, SerCtx};
pub use engine::{SerDes, SerDesOptions, Serialized};
pub use key_transformer::{CamelToSnakeCase, KeyTransformer};
pub use registry::{CodecRegistry, CodecRegistryBuilder};
pub use schema::{ColumnType, ResponseSchema, ScalarType, PRIMARY_KEY_SCHEMA, PROJECTION_SCHEMA};
pub use wire::{NumericMode, WireValue};
