//! DataAPI - client for a document and table database over HTTP
//!
//! The client speaks two data models ("universes"): schemaless JSON
//! collections and typed tables. Host values are converted to and from the
//! wire by a codec-driven serialization engine, and reads come back through
//! lazily paginated cursors.
//!
//! # Quick Start
//!
//! ```ignore
//! use dataapi::{ClientConfig, DataApiClient, FindOptions, Value};
//!
//! let client = DataApiClient::new(ClientConfig::new("https://db.example.com"))?;
//! let users = client.collection("users");
//!
//! users.insert_one(Value::object([("name", Value::from("ada"))]), Default::default())?;
//!
//! let mut cursor = users.find(Value::object([("name", Value::from("ada"))]), FindOptions::default())?;
//! while let Some(user) = cursor.next()? {
//!     println!("{:?}", user);
//! }
//! ```
//!
//! # Architecture
//!
//! - `dataapi-core`: host value model and paths
//! - `dataapi-serdes`: codec registry, serialization engine, table schemas
//! - `dataapi-client`: transport, commands, cursors, collections and tables
//!
//! Everything a caller needs is re-exported here.

pub use dataapi_client::*;
pub use dataapi_core::{
    DataApiDuration, DataApiVector, ObjectId, PathPattern, PathSegment, TypeTag, Value, ValuePath,
};
pub use dataapi_serdes::{
    CamelToSnakeCase, Codec, CodecRegistry, CodecRegistryBuilder, DesAction, DesCtx, KeyTransformer,
    SerAction, SerCtx, SerDes, SerDesOptions, Universe,
};
