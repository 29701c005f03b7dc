//! Per-call traversal state
//!
//! A context is created at the start of one serialize/deserialize call,
//! threaded by `&mut` through the whole traversal, and dropped at the end.
//! It is never shared between calls.

use dataapi_core::{PathSegment, ValuePath};

use crate::codec::Universe;
use crate::schema::{ColumnType, ResponseSchema};
use crate::wire::NumericMode;

/// Serialization context
#[derive(Debug)]
pub struct SerCtx {
    universe: Universe,
    pub(crate) path: ValuePath,
    big_numbers: bool,
}

impl SerCtx {
    pub(crate) fn new(universe: Universe) -> Self {
        Self {
            universe,
            path: ValuePath::root(),
            big_numbers: false,
        }
    }

    /// Universe being serialized
    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Path of the node being visited
    pub fn path(&self) -> &ValuePath {
        &self.path
    }

    /// Key of the node being visited (`""` for the root)
    pub fn name(&self) -> Option<&str> {
        current_name(&self.path)
    }

    /// Record that the payload carries a number needing extended precision
    pub fn mark_big_number(&mut self) {
        self.big_numbers = true;
    }

    /// Whether a big number has been seen so far
    pub fn big_numbers(&self) -> bool {
        self.big_numbers
    }
}

/// What a deserialize call decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesTarget {
    /// A document or projected row (object keyed by field/column)
    Record,
    /// A primary-key tuple (array aligned to the primary-key column order)
    PrimaryKey,
}

/// Deserialization context
#[derive(Debug)]
pub struct DesCtx<'a> {
    universe: Universe,
    pub(crate) path: ValuePath,
    schema: Option<&'a ResponseSchema>,
    pub(crate) declared: Option<&'a ColumnType>,
    target: DesTarget,
    numeric: NumericMode,
}

impl<'a> DesCtx<'a> {
    pub(crate) fn new(
        universe: Universe,
        schema: Option<&'a ResponseSchema>,
        target: DesTarget,
        numeric: NumericMode,
    ) -> Self {
        Self {
            universe,
            path: ValuePath::root(),
            schema,
            declared: None,
            target,
            numeric,
        }
    }

    /// Universe being deserialized
    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Path of the node being visited
    pub fn path(&self) -> &ValuePath {
        &self.path
    }

    /// Key of the node being visited (`""` for the root)
    pub fn name(&self) -> Option<&str> {
        current_name(&self.path)
    }

    /// Server-declared schema (tables only)
    pub fn schema(&self) -> Option<&'a ResponseSchema> {
        self.schema
    }

    /// Declared type of the node being visited (tables only)
    pub fn declared_type(&self) -> Option<&'a ColumnType> {
        self.declared
    }

    /// Whether a primary-key tuple is being decoded
    pub fn parsing_primary_key(&self) -> bool {
        self.target == DesTarget::PrimaryKey
    }

    /// How untyped JSON numbers are decoded in this call
    pub fn numeric_mode(&self) -> NumericMode {
        self.numeric
    }
}

fn current_name(path: &ValuePath) -> Option<&str> {
    match path.last_segment() {
        None => Some(""),
        Some(PathSegment::Key(k)) => Some(k),
        Some(PathSegment::Index(_)) => None,
    }
}
