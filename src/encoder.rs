//! JSON encoding of attribute values and record structure.
//!
//! [`JsonEncoder`] appends JSON fragments to a caller-owned byte buffer. It
//! holds no mutable state, so one encoder can serve any number of threads as
//! long as each call gets its own buffer.
//!
//! ## Value Encoding
//!
//! Values are encoded as a general-purpose JSON encoder would, except:
//!
//! - NaN and infinities, which JSON cannot represent, become the strings
//!   `"NaN"`, `"+Inf"` and `"-Inf"`
//! - Durations are the signed nanosecond count
//! - Times go through the injected [`TimeMarshaler`]
//! - Strings are escaped HTML-safe, see [`crate::escape`]
//!
//! ## Examples
//!
//! ```rust
//! use jsonslog::{JsonEncoder, Value};
//!
//! let encoder = JsonEncoder::new();
//! let mut buf = Vec::new();
//! encoder.append_value(&mut buf, &Value::Float64(f64::NAN)).unwrap();
//! assert_eq!(buf, br#""NaN""#);
//! ```

use crate::escape::{append_json_string, append_quoted_json_string};
use crate::{Attr, Error, Result, Value};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::io::Write;

/// Renders an absolute time as a JSON value (including any quotes).
pub type TimeMarshaler = fn(&DateTime<FixedOffset>, &mut Vec<u8>) -> Result<()>;

/// Appends `t` as a quoted RFC 3339 timestamp with nanosecond precision.
///
/// Fractional seconds have trailing zeros trimmed and are omitted when zero.
/// A zero UTC offset is written as `Z`. A leap second is written as the first
/// second of the following minute, so the seconds field never reads `60`.
///
/// # Errors
///
/// Returns [`Error::Time`] if the year is outside `[0, 9999]`, which RFC 3339
/// cannot express.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use jsonslog::encoder::marshal_time_rfc3339;
///
/// let t = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
/// let mut buf = Vec::new();
/// marshal_time_rfc3339(&t.into(), &mut buf).unwrap();
/// assert_eq!(buf, br#""2000-01-02T03:04:05Z""#);
/// ```
pub fn marshal_time_rfc3339(t: &DateTime<FixedOffset>, buf: &mut Vec<u8>) -> Result<()> {
    let folded;
    let t = if t.nanosecond() >= 1_000_000_000 {
        folded = fold_leap_second(t)?;
        &folded
    } else {
        t
    };

    let year = t.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::time(format!(
            "year outside of range [0,9999]: {}",
            year
        )));
    }

    buf.push(b'"');
    write!(buf, "{}", t.format("%Y-%m-%dT%H:%M:%S"))?;
    let nanos = t.nanosecond();
    if nanos != 0 {
        write!(buf, ".{:09}", nanos)?;
        while buf.last() == Some(&b'0') {
            buf.pop();
        }
    }
    if t.offset().local_minus_utc() == 0 {
        buf.push(b'Z');
    } else {
        write!(buf, "{}", t.format("%:z"))?;
    }
    buf.push(b'"');
    Ok(())
}

/// Moves a leap second (`:60`, carried by chrono as nanos >= 1e9) onto the
/// first second of the next minute.
fn fold_leap_second(t: &DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>> {
    t.with_nanosecond(t.nanosecond() - 1_000_000_000)
        .and_then(|t| t.checked_add_signed(chrono::Duration::seconds(1)))
        .ok_or_else(|| Error::time(format!("leap second out of range: {}", t)))
}

/// Appends the JSON encoding of log values and record structure to a buffer.
#[derive(Clone, Copy, Debug)]
pub struct JsonEncoder {
    time_marshaler: TimeMarshaler,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        JsonEncoder {
            time_marshaler: marshal_time_rfc3339,
        }
    }
}

impl JsonEncoder {
    /// Creates an encoder using [`marshal_time_rfc3339`] for times.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the function used to render `Time` values and record times.
    #[must_use]
    pub fn with_time_marshaler(mut self, time_marshaler: TimeMarshaler) -> Self {
        self.time_marshaler = time_marshaler;
        self
    }

    #[inline]
    pub fn append_start(&self, buf: &mut Vec<u8>) {
        buf.push(b'{');
    }

    #[inline]
    pub fn append_end(&self, buf: &mut Vec<u8>) {
        buf.push(b'}');
    }

    /// Appends `"key":`.
    #[inline]
    pub fn append_key(&self, buf: &mut Vec<u8>, key: &str) {
        append_quoted_json_string(buf, key);
        buf.push(b':');
    }

    #[inline]
    pub fn append_string(&self, buf: &mut Vec<u8>, s: &str) {
        append_quoted_json_string(buf, s);
    }

    /// Appends the source location as the single string `"file:line"`.
    pub fn append_source(&self, buf: &mut Vec<u8>, file: &str, line: i64) {
        buf.push(b'"');
        append_json_string(buf, file);
        buf.push(b':');
        append_int(buf, line);
        buf.push(b'"');
    }

    /// Appends `t` using the configured [`TimeMarshaler`].
    ///
    /// # Errors
    ///
    /// Propagates the marshaler's error. Nothing is left in `buf` on failure.
    pub fn append_time(&self, buf: &mut Vec<u8>, t: &DateTime<FixedOffset>) -> Result<()> {
        let mark = buf.len();
        (self.time_marshaler)(t, buf).map_err(|err| {
            buf.truncate(mark);
            err
        })
    }

    /// Appends the JSON value of `attr`, without its key.
    ///
    /// # Errors
    ///
    /// See [`JsonEncoder::append_value`].
    #[inline]
    pub fn append_attr_value(&self, buf: &mut Vec<u8>, attr: &Attr) -> Result<()> {
        self.append_value(buf, &attr.value)
    }

    /// Appends the JSON encoding of `value`.
    ///
    /// Groups are written as nested objects with their members in order.
    ///
    /// # Errors
    ///
    /// Returns an error if an `Any` payload or a time cannot be marshaled.
    /// Nothing is left in `buf` on failure.
    pub fn append_value(&self, buf: &mut Vec<u8>, value: &Value) -> Result<()> {
        let mark = buf.len();
        self.append_value_inner(buf, value).map_err(|err| {
            buf.truncate(mark);
            err
        })
    }

    fn append_value_inner(&self, buf: &mut Vec<u8>, value: &Value) -> Result<()> {
        match value {
            Value::String(s) => self.append_string(buf, s),
            Value::Int64(n) => append_int(buf, *n),
            Value::Uint64(n) => append_int(buf, *n),
            Value::Float64(f) => {
                // serde_json writes null for non-finite floats.
                if f.is_nan() {
                    buf.extend_from_slice(br#""NaN""#);
                } else if *f == f64::INFINITY {
                    buf.extend_from_slice(br#""+Inf""#);
                } else if *f == f64::NEG_INFINITY {
                    buf.extend_from_slice(br#""-Inf""#);
                } else {
                    serde_json::to_writer(&mut *buf, f)?;
                }
            }
            Value::Bool(b) => buf.extend_from_slice(if *b { &b"true"[..] } else { b"false" }),
            Value::Duration(nanos) => append_int(buf, *nanos),
            Value::Time(t) => (self.time_marshaler)(t, buf)?,
            Value::Group(attrs) => {
                self.append_start(buf);
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    self.append_key(buf, &attr.key);
                    self.append_value_inner(buf, &attr.value)?;
                }
                self.append_end(buf);
            }
            Value::Any(payload) => payload.marshal_json(buf)?,
        }
        Ok(())
    }
}

/// Appends the decimal form of `n` without allocating.
#[inline]
pub(crate) fn append_int<I: itoa::Integer>(buf: &mut Vec<u8>, n: I) {
    buf.extend_from_slice(itoa::Buffer::new().format(n).as_bytes());
}
