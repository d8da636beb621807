//! Keyset pagination primitives.
//!
//! A [`Cursor`] marks the position after the last row of a page as the pair
//! `(timestamp, id)` of that row. Clients treat the encoded form as an opaque
//! token and hand it back unchanged to fetch the following page.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Separator between the timestamp and the id in an encoded cursor.
pub const CURSOR_SEPARATOR: char = '_';

/// Errors produced when decoding a client-supplied cursor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor has no '_' separator")]
    MissingSeparator,

    #[error("cursor has an empty id")]
    EmptyId,

    #[error("cursor timestamp is not RFC 3339: {0}")]
    InvalidTimestamp(String),
}

/// Position of the last row returned by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Value of the order column for that row, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Row identifier, the tie-breaker for equal timestamps.
    pub id: String,
}

impl Cursor {
    /// Create a cursor for the row `(timestamp, id)`.
    pub fn new<Tz: TimeZone>(timestamp: &DateTime<Tz>, id: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&Utc),
            id: id.into(),
        }
    }

    /// Encode as `{ISO-8601 timestamp}_{id}`.
    ///
    /// Sub-second digits are kept at whatever precision the timestamp has so
    /// that decoding yields exactly the stored value.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}{CURSOR_SEPARATOR}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.id
        )
    }

    /// Decode an encoded cursor, splitting on the first separator.
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        let (timestamp, id) = raw
            .split_once(CURSOR_SEPARATOR)
            .ok_or(CursorError::MissingSeparator)?;

        if id.is_empty() {
            return Err(CursorError::EmptyId);
        }

        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| CursorError::InvalidTimestamp(e.to_string()))?;

        Ok(Self::new(&timestamp, id))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One page of a cursor-paginated listing.
///
/// `next_cursor` is `Some` exactly when `has_more` is true. Use the
/// constructors rather than building the struct by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    /// A page with no rows and nothing after it.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// The final page of a listing.
    #[must_use]
    pub const fn last(data: Vec<T>) -> Self {
        Self {
            data,
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page followed by more rows, resumable from `next_cursor`.
    #[must_use]
    pub const fn with_next(data: Vec<T>, next_cursor: Cursor) -> Self {
        Self {
            data,
            next_cursor: Some(next_cursor),
            has_more: true,
        }
    }

    /// Convert every row, keeping the cursor and `has_more` flag.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}
