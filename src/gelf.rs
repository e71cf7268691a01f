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

//! A preset for the [Graylog Extended Log Format] (GELF).
//!
//! [Graylog Extended Log Format]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! GELF wants a `short_message` (our excerpt) on every record, optionally a `full_message`, and
//! prefixes every additional field with an underscore. The preset configures a [`Log`]
//! accordingly:
//!
//! | slot                      | key             |
//! |---------------------------|-----------------|
//! | [`Slot::Original`]        | `full_message`  |
//! | [`Slot::Excerpt`]         | `short_message` |
//! | [`Slot::Trail`]           | `_trail`        |
//! | [`Slot::Location`]        | `_file`         |
//!
//! with the excerpt slot sticky (so a short message is sent as `short_message` alone), excerpts
//! of at most 120 code points with newlines replaced by spaces, and a `version` annotation. The
//! `timestamp` annotation is computed afresh for every record.
//!
//! ```rust
//! use jsonline::{gelf, sink::WriterSink};
//! let log = gelf::builder(WriterSink::new(Vec::new()))
//!     .kv("host", "example.org")
//!     .without_computed()
//!     .build();
//! log.write(b"Hello, World!".as_slice()).unwrap();
//! assert_eq!(
//!     *log.sink().lock(),
//!     b"{\"host\":\"example.org\",\"short_message\":\"Hello, World!\",\"version\":\"1.1\"}\n"
//! );
//! ```
//!
//! GELF also requires a `host` field, which the preset leaves alone: use [`with_host`] to discover
//! one, or supply one yourself.

use crate::{
    error::{Error, Result},
    excerpt::Marks,
    kv::Kv,
    log::{Log, LogBuilder},
    record::Slot,
    sink::Sink,
};

use backtrace::Backtrace;
use chrono::Utc;
use tracing::debug;

/// The GELF specification version these records follow
pub const VERSION: &str = "1.1";

/// GELF preset, writing to `sink`
pub fn gelf<K: Sink>(sink: K) -> Log<K> {
    builder(sink).build()
}

/// GELF preset, for further customization
pub fn builder<K: Sink>(sink: K) -> LogBuilder<K> {
    Log::builder(sink)
        .kv("version", VERSION)
        .computed(|| Kv::new("timestamp", Utc::now().timestamp()))
        .truncate(120)
        .key(Slot::Original, "full_message")
        .key(Slot::Excerpt, "short_message")
        .key(Slot::Trail, "_trail")
        .key(Slot::Location, "_file")
        .sticky(Slot::Excerpt)
        .marks(Marks::sentinels())
        .replace("\n", " ")
}

/// GELF preset with a `host` annotation naming this machine; see [`discover_host`]
pub fn with_host<K: Sink>(sink: K) -> Result<LogBuilder<K>> {
    Ok(builder(sink).kv("host", discover_host()?))
}

/// Attempt to figure-out a name for this host.
///
/// This will first simply try [gethostname()], then fall back to an IP address for this host.
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
pub fn discover_host() -> Result<String> {
    // `hostname::get()` returns an `OsString`; GELF wants a string, so anything we can't represent
    // is replaced.
    hostname::get()
        .map_err(|err| Error::NoHostname {
            source: Box::new(err),
            back: Backtrace::new(),
        })
        .map(|hn| hn.to_string_lossy().into_owned())
        .or_else(|err| {
            debug!("Falling back to an IP address: {}", err);
            local_ip_address::local_ip()
                .map(|ip| ip.to_string())
                .map_err(|err| Error::NoHostname {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })
        })
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::sink::WriterSink;

    use serde_json::json;

    fn fixed() -> Log<WriterSink<Vec<u8>>> {
        builder(WriterSink::new(Vec::new()))
            .without_computed()
            .computed(|| Kv::new("timestamp", 1602785340))
            .build()
    }

    fn record(log: &Log<WriterSink<Vec<u8>>>, msg: &str) -> serde_json::Value {
        let rec = log.encode(msg.as_bytes()).unwrap();
        serde_json::from_slice(&rec).unwrap()
    }

    #[test]
    fn short_message() {
        assert_eq!(
            record(&fixed(), "Hello, World!"),
            json!({"version": "1.1", "timestamp": 1602785340, "short_message": "Hello, World!"})
        );
    }

    #[test]
    fn long_message() {
        let msg = "x".repeat(121);
        assert_eq!(
            record(&fixed(), &msg),
            json!({
                "version": "1.1",
                "timestamp": 1602785340,
                "full_message": msg,
                "short_message": format!("{}…", "x".repeat(120)),
            })
        );
        assert_eq!(
            record(&fixed(), "Hello,\nWorld!"),
            json!({
                "version": "1.1",
                "timestamp": 1602785340,
                "full_message": "Hello,\nWorld!",
                "short_message": "Hello, World!",
            })
        );
    }

    #[test]
    fn file_location() {
        let log = builder(WriterSink::new(Vec::new()))
            .without_computed()
            .location(crate::record::LocationMode::LongFile)
            .build();
        assert_eq!(
            record(&log, "path/to/file1:23: Hello, World!"),
            json!({
                "version": "1.1",
                "full_message": "path/to/file1:23: Hello, World!",
                "short_message": "Hello, World!",
                "_file": "path/to/file1:23",
            })
        );
    }

    #[test]
    fn explicit_full_message() {
        let log = fixed().with([Kv::new("full_message", "elsewhere")]);
        assert_eq!(
            record(&log, "Hello, World!"),
            json!({
                "version": "1.1",
                "timestamp": 1602785340,
                "full_message": "elsewhere",
                "short_message": "Hello, World!",
            })
        );
    }

    #[test]
    fn timestamp_is_current() {
        let before = Utc::now().timestamp();
        let log = gelf(WriterSink::new(Vec::new()));
        let rec = record(&log, "m");
        let ts = rec["timestamp"].as_i64().unwrap();
        assert!(ts >= before && ts <= Utc::now().timestamp());
    }

    #[test]
    fn host_discovery() {
        let host = discover_host().unwrap();
        assert!(!host.is_empty());
        let log = with_host(WriterSink::new(Vec::new())).unwrap().build();
        assert_eq!(record(&log, "m")["host"], json!(host));
    }

    #[cfg(feature = "graylog")]
    #[test]
    fn graylog() {
        use crate::sink::UdpSink;
        let log = with_host(UdpSink::local().unwrap()).unwrap().build();
        log.write(b"Hello from jsonline!".as_slice()).unwrap();
    }
}
