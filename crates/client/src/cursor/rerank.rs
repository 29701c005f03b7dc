//! Cursor over `findAndRerank` results
//!
//! The server runs the hybrid sub-queries, merges and reranks their
//! candidates, and answers with a single page. Consumption otherwise works
//! like [`FindCursor`](super::FindCursor).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dataapi_core::{DataApiVector, Value};
use dataapi_serdes::WireValue;

use super::options::{HybridLimits, RerankOptions};
use super::state::CursorCore;
use super::{CursorState, Page, RerankFetcher, RerankRequest};
use crate::error::{Error, Result};

/// One reranked record with its scores
#[derive(Debug, Clone, PartialEq)]
pub struct RerankedResult<T> {
    /// The record
    pub document: T,
    /// Scores by name, e.g. `$rerank`, `$vector`, `$lexical`
    pub scores: HashMap<String, f64>,
}

impl<T> RerankedResult<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> RerankedResult<U> {
        RerankedResult {
            document: f(self.document),
            scores: self.scores,
        }
    }
}

type Mapper<T> = Arc<dyn Fn(Value) -> T + Send + Sync>;

/// Cursor over the results of a hybrid search followed by reranking
pub struct FindAndRerankCursor<T = Value> {
    fetcher: Arc<dyn RerankFetcher>,
    options: RerankOptions,
    mapper: Mapper<T>,
    mapped: bool,
    timeout: Duration,
    core: CursorCore<RerankedResult<Value>>,
}

impl<T> fmt::Debug for FindAndRerankCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindAndRerankCursor")
            .field("options", &self.options)
            .field("state", &self.core.state())
            .field("buffered", &self.core.buffered())
            .field("consumed", &self.core.consumed())
            .finish()
    }
}

impl FindAndRerankCursor<Value> {
    /// Create a cursor yielding decoded records
    pub fn new(fetcher: Arc<dyn RerankFetcher>, options: RerankOptions, timeout: Duration) -> Self {
        Self {
            core: CursorCore::new(options.limit, None).single_page(),
            fetcher,
            options,
            mapper: Arc::new(|record: Value| record),
            mapped: false,
            timeout,
        }
    }
}

impl<T: 'static> FindAndRerankCursor<T> {
    fn with_options(&self, change: impl FnOnce(&mut RerankOptions)) -> Self {
        let mut options = self.options.clone();
        change(&mut options);
        Self {
            core: CursorCore::new(options.limit, None).single_page(),
            fetcher: Arc::clone(&self.fetcher),
            options,
            mapper: Arc::clone(&self.mapper),
            mapped: self.mapped,
            timeout: self.timeout,
        }
    }

    /// New cursor with a different filter
    pub fn filter(&self, filter: Value) -> Self {
        self.with_options(|o| o.filter = filter)
    }

    /// New cursor with a different hybrid sort
    pub fn sort(&self, sort: WireValue) -> Self {
        self.with_options(|o| o.sort = Some(sort))
    }

    /// New cursor returning at most `limit` results
    pub fn limit(&self, limit: u64) -> Self {
        self.with_options(|o| o.limit = (limit > 0).then_some(limit))
    }

    /// New cursor with different candidate limits
    pub fn hybrid_limits(&self, limits: HybridLimits) -> Self {
        self.with_options(|o| o.hybrid_limits = Some(limits))
    }

    /// New cursor reranking on a different field
    pub fn rerank_on(&self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.with_options(|o| o.rerank_on = Some(field))
    }

    /// New cursor with a different rerank query
    pub fn rerank_query(&self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.with_options(|o| o.rerank_query = Some(query))
    }

    /// New cursor that does or does not request scores
    pub fn include_scores(&self, include: bool) -> Self {
        self.with_options(|o| o.include_scores = include)
    }

    /// New cursor that does or does not request the sort vector
    pub fn include_sort_vector(&self, include: bool) -> Self {
        self.with_options(|o| o.include_sort_vector = include)
    }

    /// New cursor with a different projection.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` once a mapping function is set.
    pub fn project(&self, projection: WireValue) -> Result<Self> {
        if self.mapped {
            return Err(Error::InvalidCursorConfig {
                reason: "cannot set a projection after a mapping function".into(),
            });
        }
        Ok(self.with_options(|o| o.projection = Some(projection)))
    }

    /// New cursor whose documents are passed through `f`
    pub fn map<U, F>(&self, f: F) -> FindAndRerankCursor<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.mapper);
        FindAndRerankCursor {
            core: CursorCore::new(self.options.limit, None).single_page(),
            fetcher: Arc::clone(&self.fetcher),
            options: self.options.clone(),
            mapper: Arc::new(move |record| f(inner(record))),
            mapped: true,
            timeout: self.timeout,
        }
    }

    fn buffer_more(&mut self) -> Result<bool> {
        let fetcher = &self.fetcher;
        let options = &self.options;
        let timeout = self.timeout;
        self.core
            .ensure_buffered(|_| fetcher.fetch_reranked(&RerankRequest { options }, timeout))
    }

    /// Next result, fetching the page on first use
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<RerankedResult<T>>> {
        if !self.buffer_more()? {
            return Ok(None);
        }
        Ok(self.core.pop().map(|r| r.map(|doc| (self.mapper)(doc))))
    }

    /// Whether another result is available
    pub fn has_next(&mut self) -> Result<bool> {
        self.buffer_more()
    }

    /// Drain the cursor into a vector
    pub fn to_vec(&mut self) -> Result<Vec<RerankedResult<T>>> {
        let mut out = Vec::new();
        while self.buffer_more()? {
            out.extend(
                self.core
                    .drain(None)
                    .into_iter()
                    .map(|r| r.map(|doc| (self.mapper)(doc))),
            );
        }
        Ok(out)
    }

    /// Results fetched but not yet yielded
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// Results yielded so far
    pub fn consumed(&self) -> u64 {
        self.core.consumed()
    }

    /// Remove up to `max` buffered results without mapping them
    pub fn consume_buffer(&mut self, max: Option<usize>) -> Vec<RerankedResult<Value>> {
        self.core.drain(max)
    }

    /// Back to `Idle` with an empty buffer
    pub fn rewind(&mut self) {
        self.core.rewind();
    }

    /// Stop fetching; buffered results stay readable
    pub fn close(&mut self) {
        self.core.close();
    }

    /// Current lifecycle state
    pub fn state(&self) -> CursorState {
        self.core.state()
    }

    /// Options the cursor was built with
    pub fn options(&self) -> &RerankOptions {
        &self.options
    }

    /// Query vector the server sorted by, fetching the page if needed
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` unless `include_sort_vector` is set.
    pub fn sort_vector(&mut self) -> Result<Option<DataApiVector>> {
        if !self.options.include_sort_vector {
            return Err(Error::InvalidCursorConfig {
                reason: "sort vector requested without include_sort_vector".into(),
            });
        }
        if self.core.state() == CursorState::Idle {
            let fetcher = &self.fetcher;
            let options = &self.options;
            let timeout = self.timeout;
            self.core
                .fetch_once(|_| fetcher.fetch_reranked(&RerankRequest { options }, timeout))?;
        }
        Ok(self.core.sort_vector().cloned())
    }
}

/// Split a reranked record into document and scores.
///
/// The server reports scores per document under `scores`, next to the
/// records in `data.documents`.
pub(crate) fn reranked(document: Value, scores: Option<&WireValue>) -> RerankedResult<Value> {
    let scores = scores
        .and_then(WireValue::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_f64().map(|s| (k.clone(), s)))
                .collect()
        })
        .unwrap_or_default();
    RerankedResult { document, scores }
}

impl Page<RerankedResult<Value>> {
    /// A reranked page is always the last one
    pub fn reranked(records: Vec<RerankedResult<Value>>, sort_vector: Option<DataApiVector>) -> Self {
        Self {
            records,
            next_page_state: None,
            sort_vector,
        }
    }
}
