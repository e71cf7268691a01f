// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of jsonline.
//
// jsonline is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// jsonline is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with jsonline.  If not,
// see <http://www.gnu.org/licenses/>.

//! A [`tracing-subscriber`] [`Layer`] that writes each [`Event`] as a record.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! The event's `message` field becomes the message; every other field becomes an annotation for
//! that record alone. If the [`Log`]'s [`LocationMode`] is on, the message is prefixed with the
//! event's "file:line" so that the assembler can split it back out into its own field.

use crate::{
    error::Result,
    gelf,
    kv::Kv,
    log::Log,
    record::LocationMode,
    sink::{Sink, UdpSink},
};

use tracing::Event;
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         event visitor                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    kvs: Vec<Kv>,
}

impl EventVisitor {
    fn push<V: Into<crate::value::Value>>(&mut self, field: &tracing::field::Field, value: V) {
        // `tracing-log` smuggles the `log` crate's metadata in as fields; that's already been
        // accounted-for by `normalized_metadata()`.
        #[cfg(feature = "tracing-log")]
        if field.name().starts_with("log.") {
            return;
        }
        self.kvs.push(Kv::new(field.name(), value));
    }
}

impl tracing::field::Visit for EventVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // The tracing macros "pre-format" the `message` field, so `value` is really a
            // `std::fmt::Arguments`, whose debug format has no enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, format!("{:?}", value));
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.push(field, value);
        }
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, value);
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, value);
    }
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.push(field, value);
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, value);
    }
    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.push(field, value.to_string());
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will write [`Event`]s through
/// a [`Log`].
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<S, K: Sink>
where
    S: tracing::Subscriber,
{
    log: Log<K>,
    target: Option<String>,
    // 👇 gets the compiler to shut-up about unused type parameters.
    subscriber_type: std::marker::PhantomData<S>,
}

/// A [`Layer`] implementation sending GELF records over UDP.
impl<S> Layer<S, UdpSink>
where
    S: tracing::Subscriber,
{
    /// Attempt to construct a [`Layer`] that will send GELF records (with a discovered `host`
    /// field) via UDP to port 12201 on localhost
    pub fn try_default() -> Result<Self> {
        Ok(Layer::new(gelf::with_host(UdpSink::local()?)?.build()))
    }
}

impl<S, K: Sink> Layer<S, K>
where
    S: tracing::Subscriber,
{
    pub fn new(log: Log<K>) -> Self {
        Layer {
            log,
            target: None,
            subscriber_type: std::marker::PhantomData,
        }
    }
    /// Annotate each record with the event's target, under `key`
    pub fn with_target<T: Into<String>>(mut self, key: T) -> Self {
        self.target = Some(key.into());
        self
    }
    pub fn log(&self) -> &Log<K> {
        &self.log
    }
}

fn basename(file: &str) -> &str {
    file.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file)
}

impl<S, K> tracing_subscriber::layer::Layer<S> for Layer<S, K>
where
    S: tracing::Subscriber,
    K: Sink + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        if let Some(key) = &self.target {
            visitor.kvs.push(Kv::new(key.as_str(), meta.target()));
        }

        let message = visitor.message.map(|msg| {
            match (self.log.assembler().location(), meta.file(), meta.line()) {
                (LocationMode::LongFile, Some(file), Some(line)) => {
                    format!("{}:{}: {}", file, line, msg)
                }
                (LocationMode::ShortFile, Some(file), Some(line)) => {
                    format!("{}:{}: {}", basename(file), line, msg)
                }
                _ => msg,
            }
        });

        self.log
            .write_with(&visitor.kvs, message.as_ref().map(|msg| msg.as_bytes()))
            .map(|_| ())
            .unwrap_or_else(|err| {
                ::tracing::error!("jsonline layer failed: {}", err);
            })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;
    use crate::sink::WriterSink;

    use serde_json::json;
    use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`

    fn log() -> Log<WriterSink<Vec<u8>>> {
        gelf::builder(WriterSink::new(Vec::new()))
            .without_computed()
            .build()
    }

    fn records(log: &Log<WriterSink<Vec<u8>>>) -> Vec<serde_json::Value> {
        log.sink()
            .lock()
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).unwrap())
            .collect()
    }

    #[test]
    fn messages_and_fields() {
        let log = log();
        let subscriber = tracing_subscriber::registry().with(Layer::new(log.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(answer = 42, user = "jdoe", ok = true, "Hello, {}!", "World");
            tracing::warn!(ratio = 0.5);
        });
        assert_eq!(
            records(&log),
            vec![
                json!({
                    "version": "1.1",
                    "short_message": "Hello, World!",
                    "answer": 42,
                    "user": "jdoe",
                    "ok": true,
                }),
                // no message at all
                json!({
                    "version": "1.1",
                    "full_message": null,
                    "short_message": "_EMPTY_",
                    "ratio": 0.5,
                }),
            ]
        );
    }

    #[test]
    fn locations() {
        let log = gelf::builder(WriterSink::new(Vec::new()))
            .without_computed()
            .location(LocationMode::ShortFile)
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(Layer::new(log.clone()).with_target("_target"));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Hello, World!");
        });
        let recs = records(&log);
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec["short_message"], json!("Hello, World!"));
        assert_eq!(rec["_target"], json!(module_path!()));
        let file = rec["_file"].as_str().unwrap();
        assert!(file.starts_with("layer.rs:"));
        assert_eq!(
            rec["full_message"].as_str().unwrap(),
            format!("{}: Hello, World!", file)
        );
    }

    #[test]
    fn basenames() {
        assert_eq!(basename("src/layer.rs"), "layer.rs");
        assert_eq!(basename("layer.rs"), "layer.rs");
        assert_eq!(basename("c:\\src\\layer.rs"), "layer.rs");
    }
}
