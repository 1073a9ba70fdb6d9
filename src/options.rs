//! Configuration options for [`JsonHandler`](crate::JsonHandler).
//!
//! ## Examples
//!
//! ```rust
//! use jsonslog::{Attr, HandlerOptions, Level};
//!
//! let options = HandlerOptions::new()
//!     .with_add_source(true)
//!     .with_level(Level::DEBUG)
//!     .with_replace_attr(|_groups, attr| {
//!         // Drop secrets, keep everything else
//!         (attr.key != "password").then_some(attr)
//!     });
//! assert!(options.add_source);
//! ```

use crate::encoder::{marshal_time_rfc3339, TimeMarshaler};
use crate::{Attr, Level};
use std::fmt;
use std::sync::Arc;

/// Rewrites or removes an attribute before it is encoded.
///
/// Receives the names of the groups enclosing the attribute (outermost
/// first) and the attribute itself. Returning `None` removes it.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

/// Configuration options for a JSON handler.
#[derive(Clone)]
pub struct HandlerOptions {
    /// Emit a `"source":"file:line"` field when the record carries one.
    pub add_source: bool,
    /// Minimum level reported as enabled by the handler.
    pub level: Level,
    /// Called for the built-in fields and every non-group attribute.
    pub replace_attr: Option<ReplaceAttr>,
    /// Renders record times and `Time` values.
    pub time_marshaler: TimeMarshaler,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            add_source: false,
            level: Level::INFO,
            replace_attr: None,
            time_marshaler: marshal_time_rfc3339,
        }
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("add_source", &self.add_source)
            .field("level", &self.level)
            .field("replace_attr", &self.replace_attr.as_ref().map(|_| "<fn>"))
            .finish_non_exhaustive()
    }
}

impl HandlerOptions {
    /// Creates default options: no source, INFO and above, no replacement,
    /// RFC 3339 times.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonslog::{HandlerOptions, Level};
    ///
    /// let options = HandlerOptions::new();
    /// assert!(!options.add_source);
    /// assert_eq!(options.level, Level::INFO);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Installs an attribute replacement callback.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonslog::HandlerOptions;
    ///
    /// let options = HandlerOptions::new()
    ///     .with_replace_attr(|_, attr| {
    ///         let key = attr.key.to_uppercase();
    ///         Some(attr.with_key(key))
    ///     });
    /// assert!(options.replace_attr.is_some());
    /// ```
    #[must_use]
    pub fn with_replace_attr<F>(mut self, replace_attr: F) -> Self
    where
        F: Fn(&[String], Attr) -> Option<Attr> + Send + Sync + 'static,
    {
        self.replace_attr = Some(Arc::new(replace_attr));
        self
    }

    #[must_use]
    pub fn with_time_marshaler(mut self, time_marshaler: TimeMarshaler) -> Self {
        self.time_marshaler = time_marshaler;
        self
    }
}
