//! Log records.

use crate::{Attr, Level};
use chrono::{DateTime, FixedOffset, Utc};
use std::panic::Location;

/// The file and line a record was emitted from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub file: String,
    /// Negative values mean the line is unknown.
    pub line: i64,
}

/// One structured logging event.
///
/// A record without a time or level omits the corresponding field from the
/// output.
///
/// # Examples
///
/// ```rust
/// use jsonslog::{Attr, Level, Record};
///
/// let record = Record::now(Level::INFO, "request served")
///     .with_attrs([Attr::string("path", "/"), Attr::int64("status", 200)]);
/// assert_eq!(record.attrs.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Record {
    pub time: Option<DateTime<FixedOffset>>,
    pub level: Option<Level>,
    pub message: String,
    pub source: Option<Source>,
    pub attrs: Vec<Attr>,
}

impl Record {
    pub fn new(
        time: impl Into<DateTime<FixedOffset>>,
        level: Level,
        message: impl Into<String>,
    ) -> Self {
        Record {
            time: Some(time.into()),
            level: Some(level),
            message: message.into(),
            source: None,
            attrs: Vec::new(),
        }
    }

    /// Creates a record stamped with the current UTC time.
    pub fn now(level: Level, message: impl Into<String>) -> Self {
        Record::new(Utc::now(), level, message)
    }

    /// Creates a record with no time and no level.
    pub fn bare(message: impl Into<String>) -> Self {
        Record {
            time: None,
            level: None,
            message: message.into(),
            source: None,
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, file: impl Into<String>, line: i64) -> Self {
        self.source = Some(Source {
            file: file.into(),
            line,
        });
        self
    }

    /// Records the location of the caller as the record's source.
    #[must_use]
    #[track_caller]
    pub fn with_caller(self) -> Self {
        let location = Location::caller();
        self.with_source(location.file(), i64::from(location.line()))
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn add_attr(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }
}
