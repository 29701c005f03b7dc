//! Common test utilities for cursor tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dataapi::{Error, FindCursor, FindOptions, Page, PageFetcher, PageRequest, Result, Value};
use parking_lot::Mutex;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Serves `total` records `{"n": 1..=total}` in pages of `page_size`.
///
/// Page tokens are the index of the first record of the page.
pub struct Pages {
    total: usize,
    page_size: usize,
    calls: Mutex<Vec<Option<String>>>,
    failures: Mutex<usize>,
}

impl Pages {
    pub fn new(total: usize, page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            page_size,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(0),
        })
    }

    /// Fail the next `n` fetches with a transport error
    pub fn fail_next(&self, n: usize) {
        *self.failures.lock() = n;
    }

    /// Number of fetches attempted, failed ones included
    pub fn fetches(&self) -> usize {
        self.calls.lock().len()
    }

    /// Page tokens requested, in order
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.calls.lock().clone()
    }
}

impl PageFetcher for Pages {
    fn fetch_page(&self, request: &PageRequest<'_>, _timeout: Duration) -> Result<Page> {
        self.calls.lock().push(request.page_state.map(str::to_string));
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::Transport {
                    reason: "connection reset".into(),
                });
            }
        }

        let start: usize = request.page_state.map_or(0, |s| s.parse().unwrap_or(0));
        let end = (start + self.page_size).min(self.total);
        let records = (start..end)
            .map(|i| Value::object([("n", Value::Int(i as i64 + 1))]))
            .collect();
        Ok(Page {
            records,
            next_page_state: (end < self.total).then(|| end.to_string()),
            sort_vector: None,
        })
    }
}

/// Cursor over `fetcher` with default options
pub fn cursor(fetcher: &Arc<Pages>) -> FindCursor {
    FindCursor::new(fetcher.clone(), FindOptions::default(), TIMEOUT).unwrap()
}

/// The `n` field of a record
pub fn n(record: &Value) -> i64 {
    match record.get("n") {
        Some(Value::Int(i)) => *i,
        other => panic!("record without n: {:?}", other),
    }
}
