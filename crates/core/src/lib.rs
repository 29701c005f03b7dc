//! Core types for the DataAPI client
//!
//! This crate defines the foundational vocabulary shared by the
//! serialization engine and the client:
//! - Value: host-native value tree for documents and rows
//! - TypeTag: discriminant used for type-based codec dispatch
//! - Extended datatypes: DataApiDuration, DataApiVector, ObjectId
//! - Paths: ValuePath, PathSegment, PathPattern
//! - Error: value conversion error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datatypes;
pub mod error;
pub mod path;
pub mod value;

pub use datatypes::{DataApiDuration, DataApiVector, ObjectId};
pub use error::{Error, Result};
pub use path::{PathPattern, PathSegment, PatternSegment, ValuePath};
pub use value::{TypeTag, Value};

// Re-export the numeric and temporal crates so callers build values
// against the same versions.
pub use bigdecimal::BigDecimal;
pub use chrono;
pub use num_bigint::BigInt;
pub use uuid::Uuid;
