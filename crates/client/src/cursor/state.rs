//! Buffer, counters and page token shared by all cursor kinds

use std::collections::VecDeque;

use dataapi_core::DataApiVector;
use tracing::debug;

use super::Page;
use crate::error::Result;

/// Lifecycle of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    /// Nothing fetched yet
    Idle,
    /// At least one page fetched and more may follow
    Started,
    /// No further pages will be fetched
    Closed,
}

/// Continuation token of a cursor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageToken {
    /// First page not requested yet
    Unset,
    /// Token of the next page
    Value(String),
    /// The server reported no further pages
    Exhausted,
}

impl PageToken {
    fn from_initial(initial: Option<&str>) -> Self {
        match initial {
            Some(token) => PageToken::Value(token.to_string()),
            None => PageToken::Unset,
        }
    }

    /// Token to send with the next request
    pub fn as_request(&self) -> Option<&str> {
        match self {
            PageToken::Value(token) => Some(token),
            PageToken::Unset | PageToken::Exhausted => None,
        }
    }
}

/// Paging state of one cursor instance
#[derive(Debug)]
pub(crate) struct CursorCore<R> {
    state: CursorState,
    buffer: VecDeque<R>,
    consumed: u64,
    token: PageToken,
    initial_token: Option<String>,
    sort_vector: Option<DataApiVector>,
    limit: Option<u64>,
    single_page: bool,
}

impl<R> CursorCore<R> {
    pub(crate) fn new(limit: Option<u64>, initial_token: Option<String>) -> Self {
        Self {
            state: CursorState::Idle,
            buffer: VecDeque::new(),
            consumed: 0,
            token: PageToken::from_initial(initial_token.as_deref()),
            initial_token,
            sort_vector: None,
            limit: limit.filter(|&l| l > 0),
            single_page: false,
        }
    }

    /// Close after the first fetch whatever the server says
    pub(crate) fn single_page(mut self) -> Self {
        self.single_page = true;
        self
    }

    pub(crate) fn state(&self) -> CursorState {
        self.state
    }

    pub(crate) fn token(&self) -> &PageToken {
        &self.token
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }

    pub(crate) fn sort_vector(&self) -> Option<&DataApiVector> {
        self.sort_vector.as_ref()
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.consumed >= limit)
    }

    /// Make sure a record is buffered, fetching as many pages as needed.
    ///
    /// Returns `false` once the cursor has nothing more to yield.
    pub(crate) fn ensure_buffered<F>(&mut self, mut fetch: F) -> Result<bool>
    where
        F: FnMut(Option<&str>) -> Result<Page<R>>,
    {
        loop {
            if self.limit_reached() {
                self.close();
                return Ok(false);
            }
            if !self.buffer.is_empty() {
                return Ok(true);
            }
            if self.state == CursorState::Closed {
                return Ok(false);
            }
            self.fill(&mut fetch)?;
        }
    }

    /// Fetch exactly one page unless the cursor is closed
    pub(crate) fn fetch_once<F>(&mut self, mut fetch: F) -> Result<()>
    where
        F: FnMut(Option<&str>) -> Result<Page<R>>,
    {
        if self.state != CursorState::Closed && !self.limit_reached() {
            self.fill(&mut fetch)?;
        }
        Ok(())
    }

    fn fill<F>(&mut self, fetch: &mut F) -> Result<()>
    where
        F: FnMut(Option<&str>) -> Result<Page<R>>,
    {
        // Nothing is updated until the fetch has succeeded.
        let page = fetch(self.token.as_request())?;

        let Page {
            mut records,
            next_page_state,
            sort_vector,
        } = page;
        let fetched = records.len();
        if let Some(limit) = self.limit {
            let room = limit.saturating_sub(self.consumed + self.buffer.len() as u64);
            records.truncate(usize::try_from(room).unwrap_or(usize::MAX));
        }
        self.buffer.extend(records);

        if self.sort_vector.is_none() {
            self.sort_vector = sort_vector;
        }
        self.token = match next_page_state {
            Some(token) if !self.single_page => PageToken::Value(token),
            _ => PageToken::Exhausted,
        };

        let capped = self
            .limit
            .is_some_and(|limit| self.consumed + self.buffer.len() as u64 >= limit);
        self.state = if self.token == PageToken::Exhausted || capped {
            CursorState::Closed
        } else {
            CursorState::Started
        };

        debug!(
            target: "dataapi::cursor",
            fetched,
            buffered = self.buffer.len(),
            has_next_page = self.token != PageToken::Exhausted,
            closed = self.state == CursorState::Closed,
            "Fetched page"
        );
        Ok(())
    }

    /// Take the next buffered record without fetching
    pub(crate) fn pop(&mut self) -> Option<R> {
        if self.limit_reached() {
            return None;
        }
        let record = self.buffer.pop_front()?;
        self.consumed += 1;
        Some(record)
    }

    /// Take up to `max` buffered records (all when `None`)
    pub(crate) fn drain(&mut self, max: Option<usize>) -> Vec<R> {
        let n = max.map_or(self.buffer.len(), |m| m.min(self.buffer.len()));
        let records: Vec<R> = self.buffer.drain(..n).collect();
        self.consumed += records.len() as u64;
        records
    }

    /// Stop fetching; buffered records can still be taken
    pub(crate) fn close(&mut self) {
        if self.state != CursorState::Closed {
            debug!(
                target: "dataapi::cursor",
                consumed = self.consumed,
                buffered = self.buffer.len(),
                "Cursor closed"
            );
        }
        self.state = CursorState::Closed;
    }

    pub(crate) fn rewind(&mut self) {
        debug!(target: "dataapi::cursor", consumed = self.consumed, "Cursor rewound");
        self.state = CursorState::Idle;
        self.buffer.clear();
        self.consumed = 0;
        self.token = PageToken::from_initial(self.initial_token.as_deref());
        self.sort_vector = None;
    }
}
