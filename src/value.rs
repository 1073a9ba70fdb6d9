//! Typed attribute values.
//!
//! This module provides [`Attr`], a key paired with a [`Value`], and the
//! [`MarshalJson`] capability used for arbitrary payloads.
//!
//! ## Core Types
//!
//! - [`Value`]: exactly one of string, signed/unsigned integer, float, bool,
//!   duration, time, group, or an arbitrary `Any` payload
//! - [`Kind`]: the discriminant of a [`Value`]
//! - [`Attr`]: an immutable key/value pair attached to a record
//!
//! ## Creating Values
//!
//! ```rust
//! use jsonslog::{Attr, Kind, Value};
//!
//! let count = Attr::int64("count", 23);
//! assert_eq!(count.value.kind(), Kind::Int64);
//!
//! // Kind inference for common Rust types
//! let elapsed = Value::from_any(std::time::Duration::from_millis(5));
//! assert_eq!(elapsed.kind(), Kind::Duration);
//!
//! // Anything serializable falls back to the Any kind
//! let tags = Value::from_any(vec!["a", "b"]);
//! assert_eq!(tags.kind(), Kind::Any);
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A payload that can render itself as JSON.
///
/// Every `T: Serialize` implements this through `serde_json`, so any type with
/// a serde implementation can be logged as an `Any` value. Serializers that
/// fail (a custom `Serialize` returning an error, a map with non-string keys)
/// surface as [`Error::Marshal`](crate::Error::Marshal).
pub trait MarshalJson: fmt::Debug + Send + Sync {
    /// Appends the JSON encoding of `self` to `buf`.
    ///
    /// On error, `buf` may hold a partial encoding; callers discard it.
    fn marshal_json(&self, buf: &mut Vec<u8>) -> crate::Result<()>;
}

impl<T> MarshalJson for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn marshal_json(&self, buf: &mut Vec<u8>) -> crate::Result<()> {
        serde_json::to_writer(buf, self)?;
        Ok(())
    }
}

/// The discriminant of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int64,
    Uint64,
    Float64,
    Bool,
    Duration,
    Time,
    Group,
    Any,
}

/// The value half of an [`Attr`].
///
/// # Examples
///
/// ```rust
/// use jsonslog::Value;
///
/// let v = Value::from("hello");
/// assert_eq!(v.as_str(), Some("hello"));
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    String(String),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Bool(bool),
    /// Elapsed time in nanoseconds.
    Duration(i64),
    Time(DateTime<FixedOffset>),
    /// Nested attributes, encoded as a JSON object.
    Group(Vec<Attr>),
    Any(Arc<dyn MarshalJson>),
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::Int64(_) => Kind::Int64,
            Value::Uint64(_) => Kind::Uint64,
            Value::Float64(_) => Kind::Float64,
            Value::Bool(_) => Kind::Bool,
            Value::Duration(_) => Kind::Duration,
            Value::Time(_) => Kind::Time,
            Value::Group(_) => Kind::Group,
            Value::Any(_) => Kind::Any,
        }
    }

    /// Wraps an arbitrary payload without kind inference.
    pub fn any<T>(payload: T) -> Self
    where
        T: MarshalJson + 'static,
    {
        Value::Any(Arc::new(payload))
    }

    /// Builds a value from `v`, choosing the most specific kind.
    ///
    /// Strings, integers of every width, floats, booleans, `std::time::Duration`,
    /// `chrono::Duration` and `chrono` date-times map onto their dedicated kinds.
    /// Anything else becomes an `Any` payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonslog::{Kind, Value};
    ///
    /// assert_eq!(Value::from_any(42u8).kind(), Kind::Uint64);
    /// assert_eq!(Value::from_any(-1i32).kind(), Kind::Int64);
    /// assert_eq!(Value::from_any(String::from("x")).kind(), Kind::String);
    /// ```
    pub fn from_any<T>(v: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        let any = &v as &dyn Any;

        macro_rules! downcast {
            ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
                $(
                    if let Some(x) = any.downcast_ref::<$ty>() {
                        return Value::$variant(*x as $target);
                    }
                )*
            };
        }

        downcast!(
            i64 => Int64 as i64,
            i32 => Int64 as i64,
            i16 => Int64 as i64,
            i8 => Int64 as i64,
            isize => Int64 as i64,
            u64 => Uint64 as u64,
            u32 => Uint64 as u64,
            u16 => Uint64 as u64,
            u8 => Uint64 as u64,
            usize => Uint64 as u64,
            f64 => Float64 as f64,
            f32 => Float64 as f64,
        );

        if let Some(s) = any.downcast_ref::<String>() {
            return Value::String(s.clone());
        }
        if let Some(s) = any.downcast_ref::<&'static str>() {
            return Value::String((*s).to_string());
        }
        if let Some(b) = any.downcast_ref::<bool>() {
            return Value::Bool(*b);
        }
        if let Some(d) = any.downcast_ref::<std::time::Duration>() {
            return Value::from(*d);
        }
        if let Some(d) = any.downcast_ref::<chrono::Duration>() {
            return Value::from(*d);
        }
        if let Some(t) = any.downcast_ref::<DateTime<Utc>>() {
            return Value::Time((*t).into());
        }
        if let Some(t) = any.downcast_ref::<DateTime<FixedOffset>>() {
            return Value::Time(*t);
        }
        Value::Any(Arc::new(v))
    }

    /// Returns the string if this is a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the signed integer if this is an `Int64` value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the time if this is a `Time` value.
    #[must_use]
    pub fn as_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the nested attributes if this is a `Group` value.
    #[must_use]
    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int64(n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<std::time::Duration> for Value {
    fn from(d: std::time::Duration) -> Self {
        Value::Duration(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl From<chrono::Duration> for Value {
    fn from(d: chrono::Duration) -> Self {
        let nanos = d.num_nanoseconds().unwrap_or(if d < chrono::Duration::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        Value::Duration(nanos)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t.into())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs)
    }
}

/// A key/value pair attached to a record.
#[derive(Clone, Debug)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attr::new(key, Value::String(value.into()))
    }

    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        Attr::new(key, Value::Int64(value))
    }

    pub fn uint64(key: impl Into<String>, value: u64) -> Self {
        Attr::new(key, Value::Uint64(value))
    }

    pub fn float64(key: impl Into<String>, value: f64) -> Self {
        Attr::new(key, Value::Float64(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Attr::new(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: std::time::Duration) -> Self {
        Attr::new(key, Value::from(value))
    }

    pub fn time(key: impl Into<String>, value: impl Into<DateTime<FixedOffset>>) -> Self {
        Attr::new(key, Value::Time(value.into()))
    }

    /// Creates a group attribute whose members nest under `key`.
    ///
    /// A group with an empty key is inlined into its parent by the handler.
    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Attr::new(key, Value::Group(attrs))
    }

    /// Creates an attribute whose kind is inferred from `value`.
    ///
    /// See [`Value::from_any`].
    pub fn any<T>(key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Attr::new(key, Value::from_any(value))
    }

    /// Returns a copy of this attribute under a different key.
    #[must_use]
    pub fn with_key(self, key: impl Into<String>) -> Self {
        Attr {
            key: key.into(),
            value: self.value,
        }
    }
}
