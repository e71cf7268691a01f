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

//! The logger
//!
//! # Introduction
//!
//! A [`Log`] bundles an [`Assembler`] (how records are laid out), a list of annotations, and a
//! [`Sink`] (where records go). It is built via [`Log::builder`]:
//!
//! ```rust
//! use jsonline::{excerpt::Marks, log::Log, record::Slot, sink::WriterSink};
//! let log = Log::builder(WriterSink::new(Vec::new()))
//!     .key(Slot::Original, "message")
//!     .key(Slot::Excerpt, "excerpt")
//!     .truncate(5)
//!     .marks(Marks::sentinels())
//!     .kv("app", "demo")
//!     .build();
//! log.write(b"Hello, World!".as_slice()).unwrap();
//! assert_eq!(
//!     *log.sink().lock(),
//!     b"{\"app\":\"demo\",\"excerpt\":\"Hello\xe2\x80\xa6\",\"message\":\"Hello, World!\"}\n"
//! );
//! ```
//!
//! # Derived loggers
//!
//! [`Log::with`] returns a new [`Log`] carrying additional annotations; the original is
//! untouched & both share the same sink. An annotation supplied later (whether via
//! [`LogBuilder::kv`] or [`Log::with`]) replaces an earlier one with the same key.
//!
//! # Concurrency
//!
//! A [`Log`] is [`Send`] & [`Sync`] whenever its sink is; it may be shared freely between threads.
//! Each record is handed to the sink in a single [`Sink::send`] call.

use crate::{
    error::Result,
    excerpt::{Mark, Marks},
    kv::Kv,
    record::{Assembler, LocationMode, Pool, Slot},
    sink::Sink,
    value::Value,
};

use std::sync::Arc;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           struct Log                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Assembles records & writes them to a [`Sink`]
pub struct Log<K: Sink> {
    assembler: Arc<Assembler>,
    kvs: Vec<Kv>,
    sink: Arc<K>,
    pool: Arc<Pool>,
}

impl<K: Sink> Clone for Log<K> {
    fn clone(&self) -> Self {
        Log {
            assembler: self.assembler.clone(),
            kvs: self.kvs.clone(),
            sink: self.sink.clone(),
            pool: self.pool.clone(),
        }
    }
}

impl<K: Sink> std::fmt::Debug for Log<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("assembler", &self.assembler)
            .field("kvs", &self.kvs)
            .finish_non_exhaustive()
    }
}

impl<K: Sink> Log<K> {
    pub fn builder(sink: K) -> LogBuilder<K> {
        LogBuilder::new(sink)
    }
    /// Derive a new [`Log`] carrying `kvs` in addition to this one's annotations
    pub fn with<I: IntoIterator<Item = Kv>>(&self, kvs: I) -> Log<K> {
        let mut all = self.kvs.clone();
        all.extend(kvs);
        Log {
            assembler: self.assembler.clone(),
            kvs: all,
            sink: self.sink.clone(),
            pool: self.pool.clone(),
        }
    }
    /// Assemble a record for `msg`, without writing it
    pub fn encode<'a, M: Into<Option<&'a [u8]>>>(&self, msg: M) -> Result<Vec<u8>> {
        self.encode_with(&[], msg.into())
    }
    pub(crate) fn encode_with(&self, extra: &[Kv], msg: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut scratch = self.pool.acquire();
        self.assembler
            .assemble(&mut scratch, self.kvs.iter().chain(extra), msg)
    }
    /// Assemble a record for `msg` & hand it to the sink, returning the number of bytes the sink
    /// accepted
    ///
    /// `None` is not the same as an empty message; see [`Assembler::assemble`]. Nothing is written
    /// if any value fails to encode.
    pub fn write<'a, M: Into<Option<&'a [u8]>>>(&self, msg: M) -> Result<usize> {
        self.write_with(&[], msg.into())
    }
    pub(crate) fn write_with(&self, extra: &[Kv], msg: Option<&[u8]>) -> Result<usize> {
        let record = self.encode_with(extra, msg)?;
        self.sink.send(&record)
    }
    /// Format `msg` & write it
    pub fn print<D: std::fmt::Display>(&self, msg: D) -> Result<usize> {
        self.write(msg.to_string().as_bytes())
    }
    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }
    pub fn kvs(&self) -> &[Kv] {
        &self.kvs
    }
    pub fn sink(&self) -> &K {
        &self.sink
    }
}

/// Lets a [`Log`] stand in wherever a byte writer is expected: each `write()` becomes one record.
impl<K: Sink> std::io::Write for &Log<K> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Log::write(*self, buf)
            .map(|_| buf.len())
            .map_err(std::io::Error::from)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct LogBuilder                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Build a [`Log`]
///
/// Nothing is configured by default: every slot's key is the empty string, the excerpt is
/// unlimited & all marks are empty.
pub struct LogBuilder<K: Sink> {
    assembler: Assembler,
    kvs: Vec<Kv>,
    sink: K,
    pool: Option<Arc<Pool>>,
}

impl<K: Sink> LogBuilder<K> {
    pub fn new(sink: K) -> LogBuilder<K> {
        LogBuilder {
            assembler: Assembler::default(),
            kvs: Vec::new(),
            sink,
            pool: None,
        }
    }
    /// Name the field for `slot`; any [`Value`] will do (it's rendered as text)
    pub fn key<V: Into<Value>>(mut self, slot: Slot, key: V) -> Self {
        self.assembler.keys[slot as usize] = Some(key.into());
        self
    }
    /// Choose which field receives a message that is its own excerpt: [`Slot::Original`] (the
    /// default) or [`Slot::Excerpt`]
    pub fn sticky(mut self, slot: Slot) -> Self {
        self.assembler.sticky = slot;
        self
    }
    pub fn mark<B: Into<Vec<u8>>>(mut self, mark: Mark, bytes: B) -> Self {
        self.assembler.marks.set(mark, bytes);
        self
    }
    pub fn marks(mut self, marks: Marks) -> Self {
        self.assembler.marks = marks;
        self
    }
    /// Limit excerpts to `max` code points; zero means no limit
    pub fn truncate(mut self, max: usize) -> Self {
        self.assembler.truncation.set_max(max);
        self
    }
    /// Replace `from` with `to` in excerpts
    pub fn replace<F: Into<Vec<u8>>, T: Into<Vec<u8>>>(mut self, from: F, to: T) -> Self {
        self.assembler.truncation = self.assembler.truncation.replace(from, to);
        self
    }
    pub fn location(mut self, mode: LocationMode) -> Self {
        self.assembler.location = mode;
        self
    }
    pub fn kv<Key: Into<Value>, V: Into<Value>>(mut self, key: Key, value: V) -> Self {
        self.kvs.push(Kv::new(key, value));
        self
    }
    pub fn kvs<I: IntoIterator<Item = Kv>>(mut self, kvs: I) -> Self {
        self.kvs.extend(kvs);
        self
    }
    /// Add an annotation computed afresh for each record; explicit annotations with the same key
    /// take precedence
    pub fn computed<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Kv + Send + Sync + 'static,
    {
        self.assembler.computed.push(Arc::new(f));
        self
    }
    /// Drop all computed annotations configured so far
    pub fn without_computed(mut self) -> Self {
        self.assembler.computed.clear();
        self
    }
    /// Share scratch space with other [`Log`]s
    pub fn pool(mut self, pool: Arc<Pool>) -> Self {
        self.pool = Some(pool);
        self
    }
    pub fn build(self) -> Log<K> {
        Log {
            assembler: Arc::new(self.assembler),
            kvs: self.kvs,
            sink: Arc::new(self.sink),
            pool: self.pool.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::sink::WriterSink;

    use serde_json::json;

    fn dummy() -> LogBuilder<WriterSink<Vec<u8>>> {
        Log::builder(WriterSink::new(Vec::new()))
            .key(Slot::Original, "message")
            .key(Slot::Excerpt, "excerpt")
            .key(Slot::Trail, "trail")
            .key(Slot::Location, "file")
            .marks(Marks::sentinels())
            .truncate(120)
            .replace("\n", " ")
    }

    fn records(log: &Log<WriterSink<Vec<u8>>>) -> Vec<serde_json::Value> {
        let out = log.sink().lock();
        assert_eq!(out.last(), Some(&b'\n'));
        out.split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).unwrap())
            .collect()
    }

    #[test]
    fn write() {
        let log = dummy().build();
        let n = log.write(b"Hello, World!".as_slice()).unwrap();
        assert_eq!(n, log.sink().lock().len());
        log.write(None::<&[u8]>).unwrap();
        assert_eq!(
            records(&log),
            vec![
                json!({"message": "Hello, World!"}),
                json!({"message": null, "excerpt": "_EMPTY_"}),
            ]
        );
    }

    #[test]
    fn with() {
        let log = dummy().kv("foo", "bar").build();
        let derived = log.with([Kv::new("foo", "baz"), Kv::new("xyz", 1)]);
        assert_eq!(log.kvs().len(), 1);
        assert_eq!(derived.kvs().len(), 3);

        derived.write(b"m".as_slice()).unwrap();
        log.write(b"m".as_slice()).unwrap();
        // both share the sink
        assert_eq!(
            records(&log),
            vec![
                json!({"foo": "baz", "xyz": 1, "message": "m"}),
                json!({"foo": "bar", "message": "m"}),
            ]
        );
    }

    #[test]
    fn chained_with() {
        let log = dummy().build();
        let a = log.with([Kv::new("k", 1)]);
        let b = a.with([Kv::new("k", 2)]);
        b.write(b"m".as_slice()).unwrap();
        a.write(b"m".as_slice()).unwrap();
        log.write(b"m".as_slice()).unwrap();
        assert_eq!(
            records(&log),
            vec![
                json!({"k": 2, "message": "m"}),
                json!({"k": 1, "message": "m"}),
                json!({"message": "m"}),
            ]
        );
    }

    #[test]
    fn failures_write_nothing() {
        let log = dummy().kv("bad", Value::raw("{")).build();
        assert!(log.write(b"m".as_slice()).unwrap_err().is_encode());
        assert!(log.sink().lock().is_empty());
    }

    #[test]
    fn print_and_io_write() {
        use std::io::Write;
        let log = dummy().build();
        log.print(format_args!("{} + {} = {}", 1, 1, 2)).unwrap();
        let mut w = &log;
        w.write_all(b"Hello, World!\n").unwrap();
        assert_eq!(
            records(&log),
            vec![
                json!({"message": "1 + 1 = 2"}),
                json!({"message": "Hello, World!\n", "excerpt": "Hello, World!"}),
            ]
        );
    }

    #[test]
    fn computed() {
        let log = dummy()
            .computed(|| Kv::new("seq", 7))
            .without_computed()
            .computed(|| Kv::new("seq", 11))
            .build();
        log.write(b"m".as_slice()).unwrap();
        log.with([Kv::new("seq", 0)]).write(b"m".as_slice()).unwrap();
        assert_eq!(
            records(&log),
            vec![
                json!({"message": "m", "seq": 11}),
                json!({"message": "m", "seq": 0}),
            ]
        );
    }

    #[test]
    fn concurrent_writers() {
        let pool = Arc::new(Pool::new());
        let log = dummy().pool(pool.clone()).build();
        std::thread::scope(|s| {
            for i in 0..8 {
                let log = log.with([Kv::new("thread", i)]);
                s.spawn(move || {
                    for j in 0..50 {
                        log.print(j).unwrap();
                    }
                });
            }
        });
        let recs = records(&log);
        assert_eq!(recs.len(), 400);
        assert!(recs.iter().all(|r| r["thread"].is_u64() && r["message"].is_string()));
        assert!(pool.idle() >= 1);
    }
}
