//! Collection handle
//!
//! A [`Collection`] holds schemaless JSON documents. Documents go through
//! the documents-universe SerDes, so timestamps, UUIDs, object ids and
//! binary values travel as `$`-sigils.

use std::sync::Arc;

use dataapi_core::Value;

use crate::config::Timeouts;
use crate::cursor::{FindAndRerankCursor, FindCursor, FindOptions, RerankOptions};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::{
    CommandOptions, DeleteOneOptions, FindOneOptions, InsertManyOptions, UpdateOneOptions,
};
use crate::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

/// A collection of documents
#[derive(Clone)]
pub struct Collection {
    endpoint: Arc<Endpoint>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("keyspace", &self.endpoint.keyspace())
            .field("name", &self.endpoint.name())
            .finish()
    }
}

impl Collection {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    /// Keyspace of the collection
    pub fn keyspace(&self) -> &str {
        self.endpoint.keyspace()
    }

    /// Insert one document.
    ///
    /// The returned id is the document's `_id`, generated by the server
    /// when the document had none.
    pub fn insert_one(&self, document: Value, options: CommandOptions) -> Result<InsertOneResult> {
        self.endpoint.insert_one(document, &options)
    }

    /// Insert documents in chunks of `options.chunk_size`.
    ///
    /// Chunks are sent one after the other; the first failing chunk ends
    /// the call. The whole call is bounded by the general method timeout.
    pub fn insert_many(
        &self,
        documents: Vec<Value>,
        options: InsertManyOptions,
    ) -> Result<InsertManyResult> {
        self.endpoint.insert_many(documents, &options)
    }

    /// First document matching `filter`, if any
    pub fn find_one(&self, filter: Value, options: FindOneOptions) -> Result<Option<Value>> {
        self.endpoint.find_one(&filter, &options)
    }

    /// Cursor over the documents matching `filter`.
    ///
    /// Nothing is sent until the cursor is read.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` if the sort needs an in-memory sort and the
    /// limit is missing or too large.
    pub fn find(&self, filter: Value, options: FindOptions) -> Result<FindCursor> {
        let timeout = self.endpoint.timeouts(&Timeouts::default()).request_timeout();
        let options = FindOptions { filter, ..options };
        FindCursor::new(self.endpoint.clone(), options, timeout)
    }

    /// Cursor over the reranked results of a hybrid search
    pub fn find_and_rerank(&self, filter: Value, options: RerankOptions) -> FindAndRerankCursor {
        let timeout = self.endpoint.timeouts(&Timeouts::default()).request_timeout();
        let options = RerankOptions { filter, ..options };
        FindAndRerankCursor::new(self.endpoint.clone(), options, timeout)
    }

    /// Apply `update` to the first document matching `filter`
    pub fn update_one(
        &self,
        filter: Value,
        update: Value,
        options: UpdateOneOptions,
    ) -> Result<UpdateResult> {
        self.endpoint.update_one(&filter, update, &options)
    }

    /// Delete the first document matching `filter`
    pub fn delete_one(&self, filter: Value, options: DeleteOneOptions) -> Result<DeleteResult> {
        self.endpoint.delete_one(&filter, &options)
    }

    /// Delete every document matching `filter`, one batch per request
    pub fn delete_many(&self, filter: Value, options: CommandOptions) -> Result<DeleteResult> {
        self.endpoint.delete_many(&filter, &options)
    }

    /// Exact count of the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// `TooManyDocumentsToCount` when the count exceeds `upper_bound` or
    /// the server's own counting limit.
    pub fn count_documents(&self, filter: Value, upper_bound: u64, options: CommandOptions) -> Result<u64> {
        self.endpoint.count_documents(&filter, upper_bound, &options)
    }

    /// Approximate number of documents, read from collection statistics
    pub fn estimated_document_count(&self, options: CommandOptions) -> Result<u64> {
        self.endpoint.estimated_document_count(&options)
    }
}
