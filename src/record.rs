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

//! Record assembly
//!
//! # Introduction
//!
//! An [`Assembler`] turns one message plus a list of annotations into one record: a single-line
//! JSON object terminated by a newline. The message is distributed across up to four fields, each
//! configured by [`Slot`]:
//!
//! - [`Slot::Original`]: the message, verbatim
//! - [`Slot::Excerpt`]: a short excerpt of the message (see [`crate::excerpt`])
//! - [`Slot::Trail`]: the message, when the caller already supplied an [`Slot::Original`] field
//! - [`Slot::Location`]: a "file:line" prefix split off the message
//!
//! Explicit annotations always win: the assembler never overwrites a field the caller supplied,
//! with one exception. When the [sticky](Assembler::sticky) slot is [`Slot::Excerpt`] and the
//! message already _is_ its own excerpt, the message lands in the excerpt field unconditionally.
//!
//! Fields are emitted sorted by key, so identical inputs give byte-identical records.
//!
//! # Scratch space
//!
//! Assembly needs a map & a buffer; rather than allocate them for every record, they're borrowed
//! from a [`Pool`] and handed back (cleared) when assembly is done.

use crate::{
    error::{Error, Result},
    excerpt::{find, Mark, Marks, Truncation},
    kv::{ComputedKv, Kv},
    value::Value,
};

use backtrace::Backtrace;
use bytes::BufMut;
use parking_lot::Mutex;

use std::{
    collections::{btree_map::Entry, BTreeMap},
    ops::{Deref, DerefMut},
};

/// The fields across which a message may be distributed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Original,
    Excerpt,
    Trail,
    Location,
}

/// Whether to split a "file:line" location off the front of the message
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LocationMode {
    /// The message is taken as-is
    #[default]
    Off,
    /// The message is expected to begin with "file:line: ", file being a bare file name
    ShortFile,
    /// The message is expected to begin with "path/to/file:line: "
    LongFile,
}

impl LocationMode {
    pub fn is_on(&self) -> bool {
        *self != LocationMode::Off
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          scratch pool                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Working space for assembling one record
#[derive(Debug, Default)]
pub struct Scratch {
    fields: BTreeMap<String, Value>,
    excerpt: Vec<u8>,
}

impl Scratch {
    fn clear(&mut self) {
        self.fields.clear();
        self.excerpt.clear();
    }
}

/// A thread-safe pool of [`Scratch`] spaces
///
/// A [`Pool`] may be shared between any number of [`Log`](crate::log::Log)s.
#[derive(Debug, Default)]
pub struct Pool {
    free: Mutex<Vec<Scratch>>,
}

impl Pool {
    pub fn new() -> Pool {
        Pool::default()
    }
    /// Borrow a (clear) [`Scratch`]; it returns to the pool when the guard drops
    pub fn acquire(&self) -> ScratchGuard<'_> {
        let scratch = self.free.lock().pop().unwrap_or_default();
        ScratchGuard {
            pool: self,
            scratch,
        }
    }
    /// The number of idle [`Scratch`] spaces
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

pub struct ScratchGuard<'a> {
    pool: &'a Pool,
    scratch: Scratch,
}

impl Deref for ScratchGuard<'_> {
    type Target = Scratch;
    fn deref(&self) -> &Scratch {
        &self.scratch
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        self.pool.free.lock().push(scratch);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct Assembler                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Everything about producing a record that doesn't vary from message to message
#[derive(Clone)]
pub struct Assembler {
    pub(crate) keys: [Option<Value>; 4],
    pub(crate) sticky: Slot,
    pub(crate) marks: Marks,
    pub(crate) truncation: Truncation,
    pub(crate) location: LocationMode,
    pub(crate) computed: Vec<ComputedKv>,
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("keys", &self.keys)
            .field("sticky", &self.sticky)
            .field("marks", &self.marks)
            .field("truncation", &self.truncation)
            .field("location", &self.location)
            .field("computed", &self.computed.len())
            .finish()
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler {
            keys: [None, None, None, None],
            sticky: Slot::Original,
            marks: Marks::new(),
            truncation: Truncation::new(0),
            location: LocationMode::Off,
            computed: Vec::new(),
        }
    }
}

impl Assembler {
    /// The key configured for `slot`, as text; an unset key is the empty string
    pub fn key(&self, slot: Slot) -> Result<String> {
        match &self.keys[slot as usize] {
            Some(key) => Ok(String::from_utf8_lossy(&key.text()?).into_owned()),
            None => Ok(String::new()),
        }
    }
    pub fn sticky(&self) -> Slot {
        self.sticky
    }
    pub fn marks(&self) -> &Marks {
        &self.marks
    }
    pub fn truncation(&self) -> &Truncation {
        &self.truncation
    }
    pub fn location(&self) -> LocationMode {
        self.location
    }

    /// Assemble a record from `kvs` & `msg`
    ///
    /// Later entries in `kvs` replace earlier ones with the same key. `msg` of `None` is
    /// distinct from an empty message: the former lands in the record as `null`. Lazy values are
    /// computed exactly once per record.
    pub fn assemble<'a, I>(
        &self,
        scratch: &mut Scratch,
        kvs: I,
        msg: Option<&[u8]>,
    ) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = &'a Kv>,
    {
        let Scratch { fields, excerpt } = scratch;

        for kv in kvs {
            fields.insert(kv.key_text()?, kv.value().clone().resolve());
        }
        for f in &self.computed {
            let kv = f();
            if let Entry::Vacant(entry) = fields.entry(kv.key_text()?) {
                entry.insert(kv.into_value().resolve());
            }
        }

        let src = msg.unwrap_or_default();

        let (mut location, mut tail) = (0, 0);
        if !src.is_empty() && self.location.is_on() {
            match find(src, b": ") {
                Some(idx) => {
                    location = idx;
                    tail = idx + 2;
                }
                None => {
                    location = src.len() - 1;
                    tail = src.len();
                }
            }
        }

        let original_key = self.key(Slot::Original)?;
        let excerpt_key = self.key(Slot::Excerpt)?;
        let trail_key = self.key(Slot::Trail)?;

        if !fields.contains_key(&excerpt_key) {
            if tail == src.len() {
                if !fields.contains_key(&original_key) {
                    excerpt.put_slice(self.marks.get(Mark::Empty));
                }
            } else {
                self.truncation.excerpt(&src[tail..], &self.marks, excerpt);
            }
        }

        if src == excerpt.as_slice() {
            if msg.is_some() {
                if self.sticky == Slot::Excerpt {
                    fields.insert(excerpt_key, Value::from(src));
                } else if !fields.contains_key(&original_key) {
                    fields.insert(original_key, Value::from(src));
                } else if !src.is_empty() {
                    fields.insert(trail_key, Value::from(src));
                }
            }
        } else {
            if !fields.contains_key(&original_key) {
                fields.insert(original_key, Value::from(msg));
            } else if !src.is_empty() {
                fields.insert(trail_key, Value::from(src));
            }
            if !excerpt.is_empty() {
                if let Entry::Vacant(entry) = fields.entry(excerpt_key) {
                    entry.insert(Value::from(excerpt.as_slice()));
                }
            }
        }

        if location != 0 {
            fields.insert(self.key(Slot::Location)?, Value::from(&src[..location]));
        }

        encode(fields)
    }
}

/// Serialize `fields` as a single-line JSON object, followed by a newline
fn encode(fields: &BTreeMap<String, Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64 * (fields.len() + 1));
    buf.put_u8(b'{');
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b',');
        }
        serde_json::to_writer(&mut buf, key.as_str()).map_err(|err| Error::Encode {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        buf.put_u8(b':');
        value.write_json(&mut buf)?;
    }
    buf.put_slice(b"}\n");
    Ok(buf)
}
