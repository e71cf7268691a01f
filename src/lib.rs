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

//! Structured log records, one JSON object per line
//!
//! # Introduction
//!
//! Log collectors such as [Graylog] or [Logstash] are happiest when each log line is a single JSON
//! object: fields are searchable, nothing needs to be parsed out with regular expressions, and a
//! multi-line message (a backtrace, say) can't be mistaken for several messages. What a _human_
//! scanning those logs wants, however, is a short, one-line summary of each message.
//!
//! [Graylog]: https://graylog.org
//! [Logstash]: https://www.elastic.co/logstash
//!
//! [jsonline](crate) assembles records that serve both. Given a message (a byte string) and a set
//! of annotations (key/value pairs), it produces a single-line JSON object in which the message is
//! distributed over up to four configurable fields:
//!
//! - the message itself
//! - an excerpt: leading & trailing whitespace trimmed, truncated to some maximum number of
//!   characters, with configurable replacements (e.g. newlines to spaces) & marks for truncated,
//!   empty or blank messages
//! - a "trail", holding the message when the caller has supplied their own message field
//! - a source location, split off the front of the message
//!
//! # Usage
//!
//! Any [`Value`](value::Value) can serve as a key or a value; [`Log::write`](log::Log::write)
//! assembles a record & hands it to a [`Sink`](sink::Sink):
//!
//! ```rust
//! use jsonline::{excerpt::Marks, kv::Kv, log::Log, record::Slot, sink::WriterSink};
//!
//! let log = Log::builder(WriterSink::new(Vec::new()))
//!     .key(Slot::Original, "message")
//!     .key(Slot::Excerpt, "excerpt")
//!     .truncate(12)
//!     .replace("\n", " ")
//!     .marks(Marks::sentinels())
//!     .build();
//!
//! let log = log.with([Kv::new("request", 42)]);
//! log.write(b"Hello,\nWorld!".as_slice()).unwrap();
//! assert_eq!(
//!     std::str::from_utf8(&log.sink().lock()).unwrap(),
//!     "{\"excerpt\":\"Hello, World…\",\"message\":\"Hello,\\nWorld!\",\"request\":42}\n"
//! );
//! ```
//!
//! The [`gelf`] module provides a preset for the Graylog Extended Log Format.
//!
//! # tracing
//!
//! [jsonline](crate) also provides a [`tracing-subscriber`] [`Layer`](layer::Layer), sending each
//! [`tracing`] event through a [`Log`](log::Log):
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! ```rust
//! use tracing::info;
//! use jsonline::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // The default configuration is to write GELF records via UDP to port 12201 on localhost.
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//!
//! info!("Hello, world!");
//! ```

pub mod error;
pub mod excerpt;
pub mod gelf;
pub mod kv;
pub mod layer;
pub mod log;
pub mod record;
pub mod sink;
pub mod value;
