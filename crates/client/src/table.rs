//! Table handle
//!
//! Rows go through the tables-universe SerDes. Every response that carries
//! rows also carries the column schema, which drives decoding and fills in
//! columns the server left out of sparse rows.

use std::sync::Arc;

use dataapi_core::Value;

use crate::config::Timeouts;
use crate::cursor::{FindCursor, FindOptions};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::{
    CommandOptions, DeleteOneOptions, FindOneOptions, InsertManyOptions, UpdateOneOptions,
};
use crate::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

/// A table of typed rows
#[derive(Clone)]
pub struct Table {
    endpoint: Arc<Endpoint>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("keyspace", &self.endpoint.keyspace())
            .field("name", &self.endpoint.name())
            .finish()
    }
}

impl Table {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    /// Keyspace of the table
    pub fn keyspace(&self) -> &str {
        self.endpoint.keyspace()
    }

    /// Insert one row; the result holds its primary key as an object
    pub fn insert_one(&self, row: Value, options: CommandOptions) -> Result<InsertOneResult> {
        self.endpoint.insert_one(row, &options)
    }

    /// Insert rows in chunks; ids come back as primary-key objects
    pub fn insert_many(&self, rows: Vec<Value>, options: InsertManyOptions) -> Result<InsertManyResult> {
        self.endpoint.insert_many(rows, &options)
    }

    /// First row matching `filter`, if any
    pub fn find_one(&self, filter: Value, options: FindOneOptions) -> Result<Option<Value>> {
        self.endpoint.find_one(&filter, &options)
    }

    /// Cursor over the rows matching `filter`
    pub fn find(&self, filter: Value, options: FindOptions) -> Result<FindCursor> {
        let timeout = self.endpoint.timeouts(&Timeouts::default()).request_timeout();
        let options = FindOptions { filter, ..options };
        FindCursor::new(self.endpoint.clone(), options, timeout)
    }

    /// Apply `update` to the row matching `filter`
    pub fn update_one(&self, filter: Value, update: Value, options: UpdateOneOptions) -> Result<UpdateResult> {
        self.endpoint.update_one(&filter, update, &options)
    }

    /// Delete the row matching `filter`
    pub fn delete_one(&self, filter: Value, options: DeleteOneOptions) -> Result<DeleteResult> {
        self.endpoint.delete_one(&filter, &options)
    }

    /// Delete every row matching `filter`
    pub fn delete_many(&self, filter: Value, options: CommandOptions) -> Result<DeleteResult> {
        self.endpoint.delete_many(&filter, &options)
    }
}
