//! # jsonslog
//!
//! The JSON side of a structured logging handler: turns log records (time,
//! level, message, source and typed key/value attributes, possibly nested in
//! groups) into one line of compact JSON each.
//!
//! ## Key Features
//!
//! - **Exact escaping**: strings are escaped the way a general-purpose JSON
//!   encoder does in HTML-safe mode, including `<`, `>`, `&`, U+2028 and U+2029
//! - **Total float support**: NaN and infinities encode as `"NaN"`, `"+Inf"`
//!   and `"-Inf"` instead of failing
//! - **Serde payloads**: any `T: Serialize` can be logged as a value
//! - **One write per record**: records are fully buffered and written with a
//!   single call, so concurrent writers never interleave and failed records
//!   leave nothing behind
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use jsonslog::{attrs, Handler, JsonHandler, Level, Record};
//!
//! let handler = JsonHandler::new(Vec::new());
//! let t = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
//! let record = Record::new(t, Level::INFO, "m").with_attrs(attrs! {
//!     "a" => 1,
//!     "m" => { "b" => 2 },
//! });
//! handler.handle(record).unwrap();
//!
//! let out = handler.inspect_sink(|out| String::from_utf8(out.clone()).unwrap());
//! assert_eq!(
//!     out,
//!     "{\"time\":\"2000-01-02T03:04:05Z\",\"level\":\"INFO\",\"msg\":\"m\",\"a\":1,\"m\":{\"b\":2}}\n"
//! );
//! ```
//!
//! ## Encoding Values Directly
//!
//! ```rust
//! use jsonslog::{to_json, Value};
//!
//! assert_eq!(to_json(&Value::from(f64::INFINITY)).unwrap(), "\"+Inf\"");
//! assert_eq!(to_json(&Value::from("a<b")).unwrap(), "\"a\\u003cb\"");
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Escaping never fails; only marshaling delegates and the sink can
//! - No panics in the public API

pub mod buffer;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod handler;
pub mod level;
pub mod macros;
pub mod options;
pub mod record;
pub mod value;

pub use buffer::BufferPool;
pub use encoder::{JsonEncoder, TimeMarshaler};
pub use error::{Error, Result};
pub use handler::{Handler, JsonHandler};
pub use level::Level;
pub use options::{HandlerOptions, ReplaceAttr};
pub use record::{Record, Source};
pub use value::{Attr, Kind, MarshalJson, Value};

/// Appends the JSON value of `attr` (without its key) to `buf`.
///
/// Uses the default RFC 3339 time marshaler. See [`JsonEncoder`] to inject a
/// different one.
///
/// # Examples
///
/// ```rust
/// use jsonslog::{append_attr_value, Attr};
///
/// let mut buf = Vec::new();
/// append_attr_value(&mut buf, &Attr::int64("n", -7)).unwrap();
/// assert_eq!(buf, b"-7");
/// ```
///
/// # Errors
///
/// Returns an error if an `Any` payload or a time cannot be marshaled. `buf`
/// is left as it was.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn append_attr_value(buf: &mut Vec<u8>, attr: &Attr) -> Result<()> {
    JsonEncoder::new().append_attr_value(buf, attr)
}

/// Encodes `value` as a JSON string.
///
/// # Errors
///
/// Returns an error if an `Any` payload or a time cannot be marshaled.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    JsonEncoder::new().append_value(&mut buf, value)?;
    // The encoder only emits valid UTF-8: escapes are ASCII and everything
    // else is copied from `&str` input or produced by serde_json.
    String::from_utf8(buf).map_err(Error::marshal)
}
