//! Operation results

use dataapi_core::Value;

/// Result of `insert_one`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// `_id` of the document, or the primary key of the row as an object
    pub inserted_id: Value,
}

/// Result of `insert_many`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// Ids in the order the server reported them
    pub inserted_ids: Vec<Value>,
}

impl InsertManyResult {
    /// Number of records inserted
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }
}

/// Result of `update_one`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    /// Records matching the filter
    pub matched_count: u64,
    /// Records actually changed
    pub modified_count: u64,
    /// Id of the record created by an upsert
    pub upserted_id: Option<Value>,
}

/// Result of `delete_one` and `delete_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    /// Records removed
    pub deleted_count: u64,
}
