//! Paginated cursors
//!
//! A cursor owns a buffer of records fetched from the server and a page
//! token. Pages are fetched lazily, one at a time, through a
//! [`PageFetcher`]; nothing is prefetched.
//!
//! ```text
//! Idle --first fetch--> Started --no next page / limit reached--> Closed
//!   ^                                                               |
//!   +---------------------------- rewind ---------------------------+
//! ```
//!
//! Builder methods never touch the cursor they are called on. They return a
//! new cursor in `Idle` state that shares the fetcher and every option not
//! being changed.
//!
//! A cursor is not meant to be driven from two threads at once; independent
//! cursors over the same collection are fully independent.

mod find;
mod options;
mod rerank;
mod state;

use std::time::Duration;

use dataapi_core::{DataApiVector, Value};
use dataapi_serdes::WireValue;

use crate::error::{Error, Result};

pub use find::{CursorIter, FindCursor};
pub use options::{FindOptions, HybridLimits, RerankOptions};
pub use rerank::{FindAndRerankCursor, RerankedResult};
pub(crate) use rerank::reranked;
pub use state::{CursorState, PageToken};

/// Largest limit the server accepts for a sort it must do in memory
pub const MAX_IN_MEMORY_SORT_LIMIT: u64 = 10_000;

/// Sort keys that are served by an index rather than sorted in memory
const SIMILARITY_SORT_KEYS: [&str; 3] = ["$vector", "$vectorize", "$hybrid"];

/// One page request issued by a [`FindCursor`]
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Options of the cursor issuing the request
    pub options: &'a FindOptions,
    /// Token of the page to fetch; `None` for the first page
    pub page_state: Option<&'a str>,
}

/// One page request issued by a [`FindAndRerankCursor`]
#[derive(Debug, Clone, Copy)]
pub struct RerankRequest<'a> {
    /// Options of the cursor issuing the request
    pub options: &'a RerankOptions,
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R = Value> {
    /// Records in server order
    pub records: Vec<R>,
    /// Token of the next page; `None` when this was the last one
    pub next_page_state: Option<String>,
    /// Query vector the server sorted by, when requested
    pub sort_vector: Option<DataApiVector>,
}

impl<R> Page<R> {
    /// A page with no next page and no sort vector
    pub fn last(records: Vec<R>) -> Self {
        Self {
            records,
            next_page_state: None,
            sort_vector: None,
        }
    }
}

/// Source of pages for a [`FindCursor`]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page.
    ///
    /// # Errors
    ///
    /// Any transport, server or decoding error. The cursor stays as it was
    /// and the call may be retried.
    fn fetch_page(&self, request: &PageRequest<'_>, timeout: Duration) -> Result<Page>;
}

/// Source of the single result page of a [`FindAndRerankCursor`]
pub trait RerankFetcher: Send + Sync {
    /// Fetch the reranked results.
    ///
    /// # Errors
    ///
    /// Any transport, server or decoding error.
    fn fetch_reranked(
        &self,
        request: &RerankRequest<'_>,
        timeout: Duration,
    ) -> Result<Page<RerankedResult<Value>>>;
}

/// Reject a sort the server would have to do in memory without a bound.
///
/// A sort that has none of `$vector`, `$vectorize` or `$hybrid` needs a
/// limit no larger than [`MAX_IN_MEMORY_SORT_LIMIT`].
pub(crate) fn check_sort(sort: Option<&WireValue>, limit: Option<u64>) -> Result<()> {
    let keys = match sort.and_then(WireValue::as_object) {
        Some(keys) if !keys.is_empty() => keys,
        _ => return Ok(()),
    };
    if keys.keys().any(|k| SIMILARITY_SORT_KEYS.contains(&k.as_str())) {
        return Ok(());
    }
    match limit {
        Some(limit) if limit <= MAX_IN_MEMORY_SORT_LIMIT => Ok(()),
        Some(limit) => Err(Error::InvalidCursorConfig {
            reason: format!(
                "sort without a vector is done in memory and allows at most {} records, got limit {}",
                MAX_IN_MEMORY_SORT_LIMIT, limit
            ),
        }),
        None => Err(Error::InvalidCursorConfig {
            reason: format!(
                "sort without a vector is done in memory; set a limit of at most {}",
                MAX_IN_MEMORY_SORT_LIMIT
            ),
        }),
    }
}
