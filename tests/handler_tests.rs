use jsonslog::{Attr, Error, Handler, HandlerOptions, JsonHandler, Level, Record, Value};
use serde::{Serialize, Serializer};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Records every `write` call so tests can count them.
#[derive(Clone, Default)]
struct CountingWriter {
    writes: Arc<AtomicUsize>,
    data: Arc<Mutex<Vec<u8>>>,
}

impl CountingWriter {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn contents(&self) -> String {
        String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct Unmarshalable;

impl Serialize for Unmarshalable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("unsupported value"))
    }
}

#[test]
fn test_one_write_per_record() {
    let sink = CountingWriter::default();
    let handler = JsonHandler::new(sink.clone());
    let attrs: Vec<Attr> = (0..200).map(|i| Attr::int64(format!("k{}", i), i)).collect();
    handler.handle(Record::now(Level::INFO, "many").with_attrs(attrs)).unwrap();
    assert_eq!(sink.writes(), 1);

    handler.handle(Record::bare("few")).unwrap();
    assert_eq!(sink.writes(), 2);
    assert_eq!(sink.contents().lines().count(), 2);
}

#[test]
fn test_encode_failure_writes_nothing() {
    let sink = CountingWriter::default();
    let handler = JsonHandler::new(sink.clone());
    let record = Record::now(Level::INFO, "m").with_attrs([
        Attr::string("before", "ok"),
        Attr::new("bad", Value::any(Unmarshalable)),
    ]);
    let err = handler.handle(record).unwrap_err();
    assert!(matches!(err, Error::Marshal(ref msg) if msg.contains("unsupported value")));
    assert_eq!(sink.writes(), 0);

    // The handler stays usable and the failed record leaves no residue.
    handler.handle(Record::bare("next")).unwrap();
    assert_eq!(sink.contents(), "{\"msg\":\"next\"}\n");
}

#[test]
fn test_time_failure_writes_nothing() {
    use chrono::{TimeZone, Utc};

    let sink = CountingWriter::default();
    let handler = JsonHandler::new(sink.clone());
    let far_future = Utc.with_ymd_and_hms(12000, 1, 1, 0, 0, 0).unwrap();
    let err = handler
        .handle(Record::new(far_future, Level::INFO, "m"))
        .unwrap_err();
    assert!(matches!(err, Error::Time(_)));
    assert_eq!(sink.writes(), 0);
}

#[test]
fn test_sink_failure_is_reported() {
    let handler = JsonHandler::new(BrokenPipe);
    let err = handler.handle(Record::bare("m")).unwrap_err();
    assert!(matches!(err, Error::Io(ref msg) if msg.contains("pipe closed")));
}

#[test]
fn test_with_attrs_failure() {
    let handler = JsonHandler::new(Vec::new());
    let result = handler.with_attrs([Attr::new("bad", Value::any(Unmarshalable))]);
    assert!(matches!(result, Err(Error::Marshal(_))));
}

#[test]
fn test_derived_handlers_share_sink() {
    let sink = CountingWriter::default();
    let root = JsonHandler::new(sink.clone());
    let child = root.with_attrs([Attr::string("component", "db")]).unwrap();
    let grandchild = child.with_group("query");

    root.handle(Record::bare("root")).unwrap();
    child.handle(Record::bare("child")).unwrap();
    grandchild
        .handle(Record::bare("grandchild").with_attrs([Attr::int64("rows", 3)]))
        .unwrap();

    assert_eq!(
        sink.contents(),
        concat!(
            "{\"msg\":\"root\"}\n",
            "{\"msg\":\"child\",\"component\":\"db\"}\n",
            "{\"msg\":\"grandchild\",\"component\":\"db\",\"query\":{\"rows\":3}}\n",
        )
    );
}

#[test]
fn test_concurrent_records_do_not_interleave() {
    let sink = CountingWriter::default();
    let handler = Arc::new(
        JsonHandler::new(sink.clone())
            .with_attrs([Attr::string("program", "stress")])
            .unwrap(),
    );

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                for i in 0..100 {
                    let record = Record::now(Level::INFO, "tick").with_attrs([
                        Attr::int64("thread", t),
                        Attr::int64("i", i),
                        Attr::string("payload", "x".repeat(64)),
                    ]);
                    handler.handle(record).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(sink.writes(), 800);
    let contents = sink.contents();
    let mut seen = 0;
    for line in contents.lines() {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["program"], "stress");
        seen += 1;
    }
    assert_eq!(seen, 800);
}

#[test]
fn test_handler_as_trait_object() {
    let handler: Box<dyn Handler> = Box::new(JsonHandler::with_options(
        Vec::new(),
        HandlerOptions::new().with_level(Level::WARN),
    ));
    assert!(!handler.enabled(Level::INFO));
    assert!(handler.enabled(Level::ERROR));
    handler.handle(Record::bare("m")).unwrap();
}

#[test]
fn test_caller_source() {
    let sink = CountingWriter::default();
    let handler = JsonHandler::with_options(sink.clone(), HandlerOptions::new().with_add_source(true));
    handler.handle(Record::bare("m").with_caller()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(sink.contents().trim_end()).unwrap();
    let source = parsed["source"].as_str().unwrap();
    assert!(source.contains("handler_tests.rs:"), "{}", source);
}
