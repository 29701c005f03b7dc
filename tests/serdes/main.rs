//! SerDes Engine Tests
//!
//! Tests for the dataapi-serdes crate which provides:
//! - CodecRegistry - codecs per universe, resolved in five tiers
//! - SerDes - host/wire conversion for documents and table rows
//! - CamelToSnakeCase - reversible key renaming
//! - ResponseSchema - column metadata driving table decoding

mod common;

mod big_numbers;
mod precedence;
mod properties;
mod tables;
