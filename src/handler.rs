//! Line-delimited JSON output of log records.
//!
//! [`JsonHandler`] turns each [`Record`] into one JSON object on one line:
//!
//! ```text
//! {"time":"2000-01-02T03:04:05Z","level":"INFO","source":"main.rs:23","msg":"m","a":1}
//! ```
//!
//! Fields appear in a fixed order: time, level, source, message, then the
//! attributes in insertion order. A record without a time or level omits that
//! field; the source appears only when enabled in [`HandlerOptions`] and known.
//!
//! The whole object is built in a private buffer and handed to the sink with a
//! single `write_all` under a lock, so concurrent records never interleave and
//! a record that fails to encode writes nothing.
//!
//! ## Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use jsonslog::{Attr, Handler, JsonHandler, Level, Record};
//!
//! let handler = JsonHandler::new(Vec::new());
//! let t = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
//! let record = Record::new(t, Level::INFO, "m").with_attrs([Attr::int64("a", 1)]);
//! handler.handle(record).unwrap();
//!
//! let line = handler.inspect_sink(|out| String::from_utf8(out.clone()).unwrap());
//! assert_eq!(line, "{\"time\":\"2000-01-02T03:04:05Z\",\"level\":\"INFO\",\"msg\":\"m\",\"a\":1}\n");
//! ```

use crate::buffer::BufferPool;
use crate::options::ReplaceAttr;
use crate::{Attr, HandlerOptions, JsonEncoder, Kind, Level, Record, Result, Value};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const SOURCE_KEY: &str = "source";
pub const MESSAGE_KEY: &str = "msg";

/// Processes log records.
///
/// Implemented by [`JsonHandler`]; the seam a logging front end drives.
pub trait Handler: Send + Sync {
    /// Reports whether records at `level` should be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Encodes and writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be marshaled or the sink rejects the
    /// write. Nothing is written in the first case.
    fn handle(&self, record: Record) -> Result<()>;
}

/// A handler that writes records to `W` as line-delimited JSON objects.
///
/// Handlers derived with [`with_attrs`](JsonHandler::with_attrs) and
/// [`with_group`](JsonHandler::with_group) share the sink, the options and the
/// buffer pool of their parent.
pub struct JsonHandler<W> {
    sink: Arc<Mutex<W>>,
    options: Arc<HandlerOptions>,
    encoder: JsonEncoder,
    pool: Arc<BufferPool>,
    /// Attributes encoded once by `with_attrs`, and the openings of groups
    /// started by `with_group`.
    preformatted: Vec<u8>,
    /// Groups opened by `with_group`, outermost first.
    groups: Vec<String>,
    /// `preformatted` ends with a group opening that has no members yet.
    group_empty: bool,
}

impl<W> Clone for JsonHandler<W> {
    fn clone(&self) -> Self {
        JsonHandler {
            sink: Arc::clone(&self.sink),
            options: Arc::clone(&self.options),
            encoder: self.encoder,
            pool: Arc::clone(&self.pool),
            preformatted: self.preformatted.clone(),
            groups: self.groups.clone(),
            group_empty: self.group_empty,
        }
    }
}

impl<W: Write> JsonHandler<W> {
    /// Creates a handler with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, HandlerOptions::default())
    }

    pub fn with_options(sink: W, options: HandlerOptions) -> Self {
        JsonHandler {
            sink: Arc::new(Mutex::new(sink)),
            encoder: JsonEncoder::new().with_time_marshaler(options.time_marshaler),
            options: Arc::new(options),
            pool: Arc::new(BufferPool::new()),
            preformatted: Vec::new(),
            groups: Vec::new(),
            group_empty: false,
        }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Runs `f` with exclusive access to the sink.
    pub fn inspect_sink<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.sink.lock())
    }

    /// Returns a handler whose records also carry `attrs`.
    ///
    /// The attributes are encoded once, now, and reused verbatim for every
    /// record. They land inside any group opened by an earlier `with_group`.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the values cannot be marshaled.
    pub fn with_attrs(&self, attrs: impl IntoIterator<Item = Attr>) -> Result<Self> {
        let mut handler = self.clone();
        let before = handler.preformatted.len();
        let mut writer = AttrWriter {
            encoder: &handler.encoder,
            replace_attr: handler.options.replace_attr.as_ref(),
            need_sep: !handler.preformatted.is_empty() && !handler.group_empty,
            buf: &mut handler.preformatted,
            groups: handler.groups.clone(),
        };
        for attr in attrs {
            writer.write_attr(attr)?;
        }
        if handler.preformatted.len() > before {
            handler.group_empty = false;
        }
        Ok(handler)
    }

    /// Returns a handler that nests all later attributes under `name`.
    ///
    /// An empty name returns an identical handler.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        let mut handler = self.clone();
        if name.is_empty() {
            return handler;
        }
        if !handler.preformatted.is_empty() && !handler.group_empty {
            handler.preformatted.push(b',');
        }
        handler.encoder.append_key(&mut handler.preformatted, name);
        handler.encoder.append_start(&mut handler.preformatted);
        handler.groups.push(name.to_string());
        handler.group_empty = true;
        handler
    }

    fn encode_record(&self, buf: &mut Vec<u8>, record: Record) -> Result<()> {
        let encoder = &self.encoder;
        encoder.append_start(buf);

        let mut writer = AttrWriter {
            encoder,
            replace_attr: self.options.replace_attr.as_ref(),
            buf,
            groups: Vec::new(),
            need_sep: false,
        };
        let replacing = writer.replace_attr.is_some();

        // Built-in fields take the fast path unless a callback must see them.
        if let Some(time) = record.time {
            if replacing {
                writer.write_attr(Attr::time(TIME_KEY, time))?;
            } else {
                writer.write_key(TIME_KEY);
                encoder.append_time(writer.buf, &time)?;
                writer.need_sep = true;
            }
        }
        if let Some(level) = record.level {
            if replacing {
                writer.write_attr(Attr::new(LEVEL_KEY, Value::any(level)))?;
            } else {
                writer.write_key(LEVEL_KEY);
                writer.buf.push(b'"');
                write!(writer.buf, "{}", level)?;
                writer.buf.push(b'"');
                writer.need_sep = true;
            }
        }
        if let Some(source) = record.source.as_ref().filter(|_| self.options.add_source) {
            if replacing {
                let location = format!("{}:{}", source.file, source.line);
                writer.write_attr(Attr::string(SOURCE_KEY, location))?;
            } else {
                writer.write_key(SOURCE_KEY);
                encoder.append_source(writer.buf, &source.file, source.line);
                writer.need_sep = true;
            }
        }
        if replacing {
            writer.write_attr(Attr::string(MESSAGE_KEY, record.message))?;
        } else {
            writer.write_key(MESSAGE_KEY);
            encoder.append_string(writer.buf, &record.message);
            writer.need_sep = true;
        }

        if !self.preformatted.is_empty() {
            if writer.need_sep {
                writer.buf.push(b',');
            }
            writer.buf.extend_from_slice(&self.preformatted);
            writer.need_sep = !self.group_empty;
        }

        if replacing {
            writer.groups.clone_from(&self.groups);
        }
        for attr in record.attrs {
            writer.write_attr(attr)?;
        }

        for _ in &self.groups {
            encoder.append_end(writer.buf);
        }
        encoder.append_end(writer.buf);
        writer.buf.push(b'\n');
        Ok(())
    }
}

impl<W: Write + Send> Handler for JsonHandler<W> {
    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, record: Record) -> Result<()> {
        let mut buf = self.pool.get();
        let result = self.encode_record(&mut buf, record);
        let result = match result {
            Ok(()) => self.sink.lock().write_all(&buf).map_err(|err| {
                tracing::warn!(error = %err, "failed to write log record");
                crate::Error::from(err)
            }),
            Err(err) => {
                tracing::debug!(error = %err, "dropping log record that failed to encode");
                Err(err)
            }
        };
        self.pool.put(buf);
        result
    }
}

/// Appends attributes to a buffer, applying the replacement callback and
/// group rules.
struct AttrWriter<'a> {
    encoder: &'a JsonEncoder,
    replace_attr: Option<&'a ReplaceAttr>,
    buf: &'a mut Vec<u8>,
    groups: Vec<String>,
    /// The buffer ends with a value, so the next key needs a separator.
    need_sep: bool,
}

impl AttrWriter<'_> {
    fn write_key(&mut self, key: &str) {
        if self.need_sep {
            self.buf.push(b',');
        }
        self.encoder.append_key(self.buf, key);
    }

    /// Writes `attr` as the next member of the current object.
    ///
    /// Groups are never passed to the callback; their members are. Empty
    /// groups are omitted, groups with an empty key are inlined, and
    /// non-group attributes with an empty key are dropped.
    fn write_attr(&mut self, attr: Attr) -> Result<()> {
        let attr = match self.replace_attr {
            Some(replace) if attr.value.kind() != Kind::Group => {
                match (**replace)(&self.groups, attr) {
                    Some(attr) => attr,
                    None => return Ok(()),
                }
            }
            _ => attr,
        };

        match attr.value {
            Value::Group(members) => {
                if members.is_empty() {
                    return Ok(());
                }
                if attr.key.is_empty() {
                    for member in members {
                        self.write_attr(member)?;
                    }
                    return Ok(());
                }
                self.write_key(&attr.key);
                self.encoder.append_start(self.buf);
                self.need_sep = false;
                self.groups.push(attr.key);
                for member in members {
                    self.write_attr(member)?;
                }
                self.groups.pop();
                self.encoder.append_end(self.buf);
                self.need_sep = true;
            }
            value => {
                if attr.key.is_empty() {
                    return Ok(());
                }
                self.write_key(&attr.key);
                self.encoder.append_value(self.buf, &value)?;
                self.need_sep = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn output<W: Write>(handler: &JsonHandler<W>) -> String
    where
        W: AsRef<[u8]>,
    {
        handler.inspect_sink(|out| String::from_utf8(out.as_ref().to_vec()).unwrap())
    }

    fn bare(attrs: Vec<Attr>) -> Record {
        Record::bare("m").with_attrs(attrs)
    }

    #[test]
    fn test_bare_record() {
        let handler = JsonHandler::new(Vec::new());
        handler.handle(bare(Vec::new())).unwrap();
        assert_eq!(output(&handler), "{\"msg\":\"m\"}\n");
    }

    #[test]
    fn test_group_rules() {
        let handler = JsonHandler::new(Vec::new());
        handler
            .handle(bare(vec![
                Attr::group("empty", Vec::new()),
                Attr::group("", vec![Attr::int64("inline", 1)]),
                Attr::int64("", 2),
                Attr::group("g", vec![Attr::int64("x", 3), Attr::group("h", vec![Attr::bool("y", true)])]),
            ]))
            .unwrap();
        assert_eq!(
            output(&handler),
            "{\"msg\":\"m\",\"inline\":1,\"g\":{\"x\":3,\"h\":{\"y\":true}}}\n"
        );
    }

    #[test]
    fn test_with_group_then_attrs() {
        let handler = JsonHandler::new(Vec::new())
            .with_attrs([Attr::int64("a", 1)])
            .unwrap()
            .with_group("g")
            .with_attrs([Attr::int64("b", 2)])
            .unwrap();
        handler.handle(bare(vec![Attr::int64("c", 3)])).unwrap();
        assert_eq!(output(&handler), "{\"msg\":\"m\",\"a\":1,\"g\":{\"b\":2,\"c\":3}}\n");
    }

    #[test]
    fn test_with_group_without_members() {
        let handler = JsonHandler::new(Vec::new()).with_group("g").with_group("h");
        handler.handle(bare(Vec::new())).unwrap();
        handler.handle(bare(vec![Attr::int64("x", 1)])).unwrap();
        assert_eq!(
            output(&handler),
            "{\"msg\":\"m\",\"g\":{\"h\":{}}}\n{\"msg\":\"m\",\"g\":{\"h\":{\"x\":1}}}\n"
        );
    }

    #[test]
    fn test_empty_group_name_is_noop() {
        let handler = JsonHandler::new(Vec::new()).with_group("");
        handler.handle(bare(vec![Attr::int64("x", 1)])).unwrap();
        assert_eq!(output(&handler), "{\"msg\":\"m\",\"x\":1}\n");
    }

    #[test]
    fn test_replace_sees_group_path() {
        let options = HandlerOptions::new().with_replace_attr(|groups, attr| {
            if attr.key == "x" {
                Some(Attr::string("x", groups.join(".")))
            } else {
                Some(attr)
            }
        });
        let handler = JsonHandler::with_options(Vec::new(), options).with_group("outer");
        handler
            .handle(bare(vec![Attr::group("inner", vec![Attr::int64("x", 0)])]))
            .unwrap();
        assert_eq!(
            output(&handler),
            "{\"msg\":\"m\",\"outer\":{\"inner\":{\"x\":\"outer.inner\"}}}\n"
        );
    }

    #[test]
    fn test_replace_can_remove_builtins() {
        let options = HandlerOptions::new()
            .with_replace_attr(|groups, attr| (!groups.is_empty() || attr.key != TIME_KEY).then_some(attr));
        let handler = JsonHandler::with_options(Vec::new(), options);
        let t = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
        handler.handle(Record::new(t, Level::WARN, "m")).unwrap();
        assert_eq!(output(&handler), "{\"level\":\"WARN\",\"msg\":\"m\"}\n");
    }

    #[test]
    fn test_replace_sees_source_as_string() {
        let options = HandlerOptions::new()
            .with_add_source(true)
            .with_replace_attr(|_, attr| {
                if attr.key != SOURCE_KEY {
                    return Some(attr);
                }
                let file = attr.value.as_str()?.rsplit('/').next()?.to_string();
                Some(Attr::string("caller", file))
            });
        let handler = JsonHandler::with_options(Vec::new(), options);
        handler
            .handle(bare(Vec::new()).with_source("/src/app/main.rs", 7))
            .unwrap();
        assert_eq!(output(&handler), "{\"caller\":\"main.rs:7\",\"msg\":\"m\"}\n");

        let dropping = JsonHandler::with_options(
            Vec::new(),
            HandlerOptions::new()
                .with_add_source(true)
                .with_replace_attr(|_, attr| (attr.key != SOURCE_KEY).then_some(attr)),
        );
        dropping.handle(bare(Vec::new()).with_source("main.rs", 7)).unwrap();
        assert_eq!(output(&dropping), "{\"msg\":\"m\"}\n");
    }

    #[test]
    fn test_replace_sees_group_path_of_preformatted_attrs() {
        let options = HandlerOptions::new().with_replace_attr(|groups, attr| {
            if attr.key == "path" {
                Some(Attr::string("path", groups.join(".")))
            } else {
                Some(attr)
            }
        });
        let handler = JsonHandler::with_options(Vec::new(), options)
            .with_attrs([Attr::string("path", "")])
            .unwrap()
            .with_group("g")
            .with_attrs([Attr::string("path", "")])
            .unwrap()
            .with_group("h")
            .with_attrs([Attr::string("path", "")])
            .unwrap();
        handler.handle(bare(Vec::new())).unwrap();
        assert_eq!(
            output(&handler),
            "{\"msg\":\"m\",\"path\":\"\",\"g\":{\"path\":\"g\",\"h\":{\"path\":\"g.h\"}}}\n"
        );
    }

    #[test]
    fn test_source_requires_option() {
        let record = || bare(Vec::new()).with_source("file.rs", 23);

        let without = JsonHandler::new(Vec::new());
        without.handle(record()).unwrap();
        assert_eq!(output(&without), "{\"msg\":\"m\"}\n");

        let with = JsonHandler::with_options(Vec::new(), HandlerOptions::new().with_add_source(true));
        with.handle(record()).unwrap();
        assert_eq!(output(&with), "{\"source\":\"file.rs:23\",\"msg\":\"m\"}\n");
    }

    #[test]
    fn test_derived_handlers_keep_options() {
        let handler = JsonHandler::with_options(
            Vec::new(),
            HandlerOptions::new().with_level(Level::WARN).with_add_source(true),
        )
        .with_group("g");
        assert_eq!(handler.options().level, Level::WARN);
        assert!(handler.options().add_source);
    }

    #[test]
    fn test_enabled() {
        let handler = JsonHandler::with_options(Vec::new(), HandlerOptions::new().with_level(Level::WARN));
        assert!(!handler.enabled(Level::INFO));
        assert!(handler.enabled(Level::WARN));
        assert!(handler.enabled(Level::ERROR));
    }
}
