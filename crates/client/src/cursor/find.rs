//! Cursor over `find` results

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use dataapi_core::{DataApiVector, Value};
use dataapi_serdes::WireValue;

use super::state::CursorCore;
use super::{check_sort, CursorState, FindOptions, Page, PageFetcher, PageRequest};
use crate::error::{Error, Result};

type Mapper<T> = Arc<dyn Fn(Value) -> T + Send + Sync>;

/// Lazily paginated cursor over the records matching a filter.
///
/// `T` is what the cursor yields: the decoded record, or whatever the
/// functions given to [`map`](FindCursor::map) turn it into.
///
/// # Example
///
/// ```ignore
/// let mut names = collection
///     .find(filter, FindOptions::default())?
///     .project(json!({"name": 1}))?
///     .limit(100)?
///     .map(|doc| doc.get("name").and_then(Value::as_str).map(str::to_string));
///
/// while let Some(name) = names.next()? {
///     println!("{:?}", name);
/// }
/// ```
pub struct FindCursor<T = Value> {
    fetcher: Arc<dyn PageFetcher>,
    options: FindOptions,
    mapper: Mapper<T>,
    mapped: bool,
    timeout: Duration,
    core: CursorCore<Value>,
}

impl<T> fmt::Debug for FindCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindCursor")
            .field("options", &self.options)
            .field("mapped", &self.mapped)
            .field("timeout", &self.timeout)
            .field("state", &self.core.state())
            .field("buffered", &self.core.buffered())
            .field("consumed", &self.core.consumed())
            .finish()
    }
}

impl FindCursor<Value> {
    /// Create a cursor yielding decoded records.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` if the options ask for an unbounded in-memory sort.
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: FindOptions, timeout: Duration) -> Result<Self> {
        check_sort(options.sort.as_ref(), options.limit)?;
        Ok(Self {
            core: CursorCore::new(options.limit, options.initial_page_state.clone()),
            fetcher,
            options,
            mapper: Arc::new(|record: Value| record),
            mapped: false,
            timeout,
        })
    }
}

impl<T: 'static> FindCursor<T> {
    fn derive(&self, options: FindOptions) -> Self {
        Self {
            core: CursorCore::new(options.limit, options.initial_page_state.clone()),
            fetcher: Arc::clone(&self.fetcher),
            options,
            mapper: Arc::clone(&self.mapper),
            mapped: self.mapped,
            timeout: self.timeout,
        }
    }

    fn with_options(&self, change: impl FnOnce(&mut FindOptions)) -> Self {
        let mut options = self.options.clone();
        change(&mut options);
        self.derive(options)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// New cursor with a different filter
    pub fn filter(&self, filter: Value) -> Self {
        self.with_options(|o| o.filter = filter)
    }

    /// New cursor with a different sort.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` if the sort has no vector key and the cursor
    /// has no limit of at most [`MAX_IN_MEMORY_SORT_LIMIT`](super::MAX_IN_MEMORY_SORT_LIMIT).
    pub fn sort(&self, sort: WireValue) -> Result<Self> {
        check_sort(Some(&sort), self.options.limit)?;
        Ok(self.with_options(|o| o.sort = Some(sort)))
    }

    /// New cursor with a different projection.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` once a mapping function is set: the mapper was
    /// written against the previous projection.
    pub fn project(&self, projection: WireValue) -> Result<Self> {
        if self.mapped {
            return Err(Error::InvalidCursorConfig {
                reason: "cannot set a projection after a mapping function".into(),
            });
        }
        Ok(self.with_options(|o| o.projection = Some(projection)))
    }

    /// New cursor yielding at most `limit` records (`0` means no limit).
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` if the new limit no longer bounds an in-memory sort.
    pub fn limit(&self, limit: u64) -> Result<Self> {
        let limit = (limit > 0).then_some(limit);
        check_sort(self.options.sort.as_ref(), limit)?;
        Ok(self.with_options(|o| o.limit = limit))
    }

    /// New cursor skipping the first `skip` records
    pub fn skip(&self, skip: u64) -> Self {
        self.with_options(|o| o.skip = Some(skip))
    }

    /// New cursor that does or does not request `$similarity`
    pub fn include_similarity(&self, include: bool) -> Self {
        self.with_options(|o| o.include_similarity = include)
    }

    /// New cursor that does or does not request the sort vector
    pub fn include_sort_vector(&self, include: bool) -> Self {
        self.with_options(|o| o.include_sort_vector = include)
    }

    /// New cursor starting from a page token
    pub fn initial_page_state(&self, page_state: impl Into<String>) -> Self {
        let page_state = page_state.into();
        self.with_options(|o| o.initial_page_state = Some(page_state))
    }

    /// New cursor with a different per-page timeout
    pub fn timeout(&self, timeout: Duration) -> Self {
        let mut cursor = self.derive(self.options.clone());
        cursor.timeout = timeout;
        cursor
    }

    /// New cursor whose records are passed through `f` after any
    /// previously set mapping
    pub fn map<U, F>(&self, f: F) -> FindCursor<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.mapper);
        FindCursor {
            core: CursorCore::new(self.options.limit, self.options.initial_page_state.clone()),
            fetcher: Arc::clone(&self.fetcher),
            options: self.options.clone(),
            mapper: Arc::new(move |record| f(inner(record))),
            mapped: true,
            timeout: self.timeout,
        }
    }

    // =========================================================================
    // Consumption
    // =========================================================================

    fn buffer_more(&mut self) -> Result<bool> {
        let fetcher = &self.fetcher;
        let options = &self.options;
        let timeout = self.timeout;
        self.core
            .ensure_buffered(|page_state| fetch(fetcher.as_ref(), options, page_state, timeout))
    }

    /// Next record, fetching a page if the buffer is empty.
    ///
    /// Returns `Ok(None)` once the cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Any error of the page fetch. The cursor is left as it was, so the
    /// call may be retried.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<T>> {
        if !self.buffer_more()? {
            return Ok(None);
        }
        Ok(self.core.pop().map(|record| (self.mapper)(record)))
    }

    /// Whether another record is available, fetching a page if needed
    pub fn has_next(&mut self) -> Result<bool> {
        self.buffer_more()
    }

    /// Next buffered record; never fetches
    pub fn try_next(&mut self) -> Option<T> {
        self.core.pop().map(|record| (self.mapper)(record))
    }

    /// Drain the cursor into a vector
    pub fn to_vec(&mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while self.buffer_more()? {
            out.extend(self.core.drain(None).into_iter().map(|r| (self.mapper)(r)));
        }
        Ok(out)
    }

    /// Call `f` on every remaining record until it breaks
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(T) -> ControlFlow<()>,
    {
        while let Some(record) = self.next()? {
            if f(record).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Records fetched but not yet yielded
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// Records yielded so far
    pub fn consumed(&self) -> u64 {
        self.core.consumed()
    }

    /// Remove up to `max` buffered records (all when `None`) without mapping
    /// them; they count as consumed
    pub fn consume_buffer(&mut self, max: Option<usize>) -> Vec<Value> {
        self.core.drain(max)
    }

    /// Back to `Idle` with an empty buffer, keeping every option
    pub fn rewind(&mut self) {
        self.core.rewind();
    }

    /// Stop fetching; records already buffered can still be read
    pub fn close(&mut self) {
        self.core.close();
    }

    /// Current lifecycle state
    pub fn state(&self) -> CursorState {
        self.core.state()
    }

    /// Options the cursor was built with
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Token of the next page, if the server returned one
    pub fn page_state(&self) -> Option<&str> {
        self.core.token().as_request()
    }

    /// Query vector the server sorted by, fetching the first page if
    /// nothing was fetched yet.
    ///
    /// # Errors
    ///
    /// `InvalidCursorConfig` unless `include_sort_vector` is set, or any
    /// error of the page fetch.
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
                .fetch_once(|page_state| fetch(fetcher.as_ref(), options, page_state, timeout))?;
        }
        Ok(self.core.sort_vector().cloned())
    }
}

fn fetch(
    fetcher: &dyn PageFetcher,
    options: &FindOptions,
    page_state: Option<&str>,
    timeout: Duration,
) -> Result<Page> {
    fetcher.fetch_page(&PageRequest { options, page_state }, timeout)
}

/// Iterator over the records of a [`FindCursor`].
///
/// Stops after yielding the first error.
pub struct CursorIter<T> {
    cursor: FindCursor<T>,
    failed: bool,
}

impl<T: 'static> Iterator for CursorIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.cursor.next() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: 'static> IntoIterator for FindCursor<T> {
    type Item = Result<T>;
    type IntoIter = CursorIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        CursorIter {
            cursor: self,
            failed: false,
        }
    }
}
