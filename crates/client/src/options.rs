//! Per-operation options

use dataapi_serdes::WireValue;

use crate::config::Timeouts;

/// Default number of records sent per `insertMany` request
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 50;

/// Options of `insert_one`, `delete_one`, `delete_many` and `count_documents`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Timeout overrides for this call
    pub timeouts: Timeouts,
}

/// Options of `insert_many`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertManyOptions {
    /// Stop at the first failing record; records are sent one chunk at a time
    pub ordered: bool,
    /// Records per request
    pub chunk_size: usize,
    /// Timeout overrides; `general_method_timeout_ms` bounds all chunks together
    pub timeouts: Timeouts,
}

impl Default for InsertManyOptions {
    fn default() -> Self {
        Self {
            ordered: false,
            chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
            timeouts: Timeouts::default(),
        }
    }
}

/// Options of `find_one`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    /// Sort document
    pub sort: Option<WireValue>,
    /// Projection document
    pub projection: Option<WireValue>,
    /// Ask for `$similarity`
    pub include_similarity: bool,
    /// Timeout overrides for this call
    pub timeouts: Timeouts,
}

/// Options of `update_one`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOneOptions {
    /// Insert a record when nothing matches
    pub upsert: bool,
    /// Pick the first match in this order
    pub sort: Option<WireValue>,
    /// Timeout overrides for this call
    pub timeouts: Timeouts,
}

/// Options of `delete_one`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOneOptions {
    /// Pick the first match in this order
    pub sort: Option<WireValue>,
    /// Timeout overrides for this call
    pub timeouts: Timeouts,
}
