//! Keyset paginator.
//!
//! Turns a store range query into bounded pages without offsets. The store
//! is asked for `limit + 1` rows after the cursor position; the extra row
//! only signals that another page exists and is never returned.
//!
//! Reads fail to empty: an unparseable cursor or a failed store query yields
//! an empty final page instead of an error, so callers always receive a
//! well-formed [`PaginatedResult`].

use std::future::Future;

use folio_common::{AppResult, Cursor, PaginatedResult};
use tracing::{debug, warn};

/// Page size used when the caller does not name one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Shapes store rows into pages of at most `limit` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    limit: u64,
}

impl Paginator {
    /// Paginator with the built-in default and maximum page sizes.
    #[must_use]
    pub fn new(limit: Option<u64>) -> Self {
        Self::with_bounds(limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Paginator with configured bounds; the page size is clamped to `1..=max`.
    #[must_use]
    pub fn with_bounds(limit: Option<u64>, default: u64, max: u64) -> Self {
        let max = max.max(1);
        Self {
            limit: limit.unwrap_or(default).clamp(1, max),
        }
    }

    /// Rows per page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows to request from the store: one more than the page size.
    #[must_use]
    pub const fn fetch_size(&self) -> u64 {
        self.limit + 1
    }

    /// Fetch one page.
    ///
    /// `query` receives the decoded cursor (`None` for the first page) and the
    /// number of rows to fetch, and must return rows ordered by
    /// `(timestamp DESC, id DESC)` strictly after the cursor. `cursor_of`
    /// extracts that `(timestamp, id)` key from a row.
    pub async fn fetch_page<T, Q, Fut, K>(
        &self,
        cursor: Option<&str>,
        query: Q,
        cursor_of: K,
    ) -> PaginatedResult<T>
    where
        Q: FnOnce(Option<Cursor>, u64) -> Fut,
        Fut: Future<Output = AppResult<Vec<T>>>,
        K: Fn(&T) -> Cursor,
    {
        let after = match cursor.map(Cursor::decode).transpose() {
            Ok(after) => after,
            Err(e) => {
                debug!(error = %e, "Rejected malformed pagination cursor");
                return PaginatedResult::empty();
            }
        };

        match query(after, self.fetch_size()).await {
            Ok(rows) => self.into_page(rows, cursor_of),
            Err(e) => {
                warn!(error = %e, "Page query failed, returning empty page");
                PaginatedResult::empty()
            }
        }
    }

    /// Truncate fetched rows to the page size and derive the next cursor.
    pub fn into_page<T, K>(&self, mut rows: Vec<T>, cursor_of: K) -> PaginatedResult<T>
    where
        K: Fn(&T) -> Cursor,
    {
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);

        if rows.len() <= limit {
            return PaginatedResult::last(rows);
        }

        rows.truncate(limit);
        match rows.last().map(cursor_of) {
            Some(next) => PaginatedResult::with_next(rows, next),
            None => PaginatedResult::last(rows),
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(None)
    }
}
