//! Writes a few records to stdout as line-delimited JSON.
//!
//! Run with: `cargo run --example basic`

use jsonslog::{attrs, Attr, Handler, HandlerOptions, JsonHandler, Level, Record};
use serde::Serialize;
use std::io;
use std::time::Duration;

#[derive(Serialize, Debug)]
struct Peer {
    addr: String,
    port: u16,
}

fn main() -> jsonslog::Result<()> {
    let options = HandlerOptions::new()
        .with_add_source(true)
        .with_replace_attr(|_, attr| (attr.key != "password").then_some(attr));
    let handler = JsonHandler::with_options(io::stdout(), options)
        .with_attrs([Attr::string("service", "demo")])?;

    handler.handle(
        Record::now(Level::INFO, "server started")
            .with_caller()
            .with_attrs(attrs! {
                "peer" => Peer { addr: "127.0.0.1".to_string(), port: 8080 },
                "startup" => Duration::from_millis(42),
            }),
    )?;

    let requests = handler.with_group("request");
    requests.handle(
        Record::now(Level::WARN, "slow <request>")
            .with_caller()
            .with_attrs(attrs! {
                "path" => "/login",
                "password" => "hunter2",
                "latency_ratio" => f64::INFINITY,
            }),
    )?;

    Ok(())
}
