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

//! Message excerpts
//!
//! # Introduction
//!
//! An excerpt is a short, single-line-friendly rendition of a log message, meant for a quick scan
//! in a log viewer. To produce one, [`Truncation::excerpt`]:
//!
//! 1. skips leading whitespace
//!
//! 2. takes at most [`Truncation::max`] code points (zero meaning "no limit")
//!
//! 3. trims trailing whitespace from what it took
//!
//! 4. applies the replacement rules, in order
//!
//! and then appends a [`Mark`] if the result is blank or was cut short.
//!
//! Lengths are counted in code points (`char`s), never bytes, so a multi-byte character is never
//! split. Bytes that aren't valid UTF-8 are carried through unchanged and count as one code
//! point each.
//!
//! ```rust
//! use jsonline::excerpt::{Marks, Truncation};
//! let t = Truncation::new(12).replace("\n", " ");
//! let mut dst = Vec::new();
//! t.excerpt(b"  Hello,\nWorld!\n", &Marks::sentinels(), &mut dst);
//! assert_eq!(std::str::from_utf8(&dst).unwrap(), "Hello, World…");
//! ```

use bytes::BufMut;

use std::char::REPLACEMENT_CHARACTER;

/// Annotations appended to, or standing in for, an excerpt
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mark {
    /// Appended to an excerpt that was cut short
    Truncated,
    /// Stands in for the excerpt when the message is empty
    Empty,
    /// Stands in for the excerpt when the message is nothing but whitespace
    Blank,
}

/// The byte strings for each [`Mark`]; all empty by default
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marks([Vec<u8>; 3]);

impl Marks {
    pub fn new() -> Marks {
        Marks::default()
    }
    /// "…" for truncated excerpts, "_EMPTY_" & "_BLANK_" otherwise
    pub fn sentinels() -> Marks {
        Marks::new()
            .with(Mark::Truncated, "…")
            .with(Mark::Empty, "_EMPTY_")
            .with(Mark::Blank, "_BLANK_")
    }
    pub fn get(&self, mark: Mark) -> &[u8] {
        &self.0[mark as usize]
    }
    pub fn set<B: Into<Vec<u8>>>(&mut self, mark: Mark, bytes: B) {
        self.0[mark as usize] = bytes.into();
    }
    pub fn with<B: Into<Vec<u8>>>(mut self, mark: Mark, bytes: B) -> Marks {
        self.set(mark, bytes);
        self
    }
}

/// Rules for building an excerpt
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Truncation {
    max: usize,
    rules: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Truncation {
    /// Excerpts of at most `max` code points (zero meaning "unlimited") & no replacement rules
    pub fn new(max: usize) -> Truncation {
        Truncation {
            max,
            rules: Vec::new(),
        }
    }
    /// Add a rule replacing every `from` with `to`
    ///
    /// Rules apply in the order they were added, each to the output of the last. A rule whose
    /// `from` is empty, or equal to `to`, is kept but has no effect.
    pub fn replace<F: Into<Vec<u8>>, T: Into<Vec<u8>>>(mut self, from: F, to: T) -> Truncation {
        self.rules.push((from.into(), to.into()));
        self
    }
    pub fn max(&self) -> usize {
        self.max
    }
    pub fn set_max(&mut self, max: usize) {
        self.max = max;
    }
    pub fn rules(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.rules
    }
    /// Append an excerpt of `src` to `dst`
    pub fn excerpt(&self, src: &[u8], marks: &Marks, dst: &mut Vec<u8>) {
        let base = dst.len();

        let (mut start, mut end) = (0, 0);
        let mut leading = true;
        let mut taken = 0;
        while let Some((ch, width)) = decode_rune(&src[end..]) {
            if leading {
                if ch.is_whitespace() {
                    start += width;
                    end += width;
                    continue;
                }
                leading = false;
            }
            if self.max > 0 && taken >= self.max {
                break;
            }
            end += width;
            taken += 1;
        }
        let truncated = end < src.len();

        while end > start {
            match decode_last_rune(&src[start..end]) {
                Some((ch, width)) if ch.is_whitespace() => end -= width,
                _ => break,
            }
        }

        dst.put_slice(&src[start..end]);

        for (from, to) in &self.rules {
            if from.is_empty() || from == to {
                continue;
            }
            // Resume the search after each insertion, so `to` is never itself rewritten.
            let mut offset = base;
            while let Some(idx) = find(&dst[offset..], from) {
                let at = offset + idx;
                dst.splice(at..at + from.len(), to.iter().copied());
                offset = at + to.len();
            }
        }

        if start == end {
            dst.put_slice(marks.get(Mark::Blank));
        } else if truncated {
            dst.put_slice(marks.get(Mark::Truncated));
        }
    }
}

/// Locate the first occurrence of `needle` in `haystack`
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Decode the first code point in `s`, along with its width in bytes; an invalid byte decodes as
/// U+FFFD with width one.
fn decode_rune(s: &[u8]) -> Option<(char, usize)> {
    let first = *s.first()?;
    if first < 0x80 {
        return Some((first as char, 1));
    }
    let width = match first {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Some((REPLACEMENT_CHARACTER, 1)),
    };
    match s.get(..width).and_then(|w| std::str::from_utf8(w).ok()) {
        Some(w) => w.chars().next().map(|ch| (ch, width)),
        None => Some((REPLACEMENT_CHARACTER, 1)),
    }
}

/// Decode the last code point in `s`; see [`decode_rune`]
fn decode_last_rune(s: &[u8]) -> Option<(char, usize)> {
    let last = *s.last()?;
    if last < 0x80 {
        return Some((last as char, 1));
    }
    let lo = s.len().saturating_sub(4);
    for begin in (lo..s.len()).rev() {
        if s[begin] & 0xc0 != 0x80 {
            if let Ok(w) = std::str::from_utf8(&s[begin..]) {
                let mut chars = w.chars();
                if let (Some(ch), None) = (chars.next(), chars.next()) {
                    return Some((ch, s.len() - begin));
                }
            }
            break;
        }
    }
    Some((REPLACEMENT_CHARACTER, 1))
}

#[cfg(test)]
mod test {

    use super::*;

    fn excerpt(t: &Truncation, marks: &Marks, src: &str) -> String {
        let mut dst = Vec::new();
        t.excerpt(src.as_bytes(), marks, &mut dst);
        String::from_utf8(dst).unwrap()
    }

    #[test]
    fn truncation() {
        let none = Marks::new();
        assert_eq!(
            excerpt(&Truncation::new(12), &none, "Hello, World!"),
            "Hello, World"
        );
        assert_eq!(
            excerpt(&Truncation::new(12), &Marks::sentinels(), "Hello, World!"),
            "Hello, World…"
        );
        assert_eq!(
            excerpt(&Truncation::new(13), &Marks::sentinels(), "Hello, World!"),
            "Hello, World!"
        );
        assert_eq!(
            excerpt(&Truncation::new(0), &Marks::sentinels(), "Hello, World!"),
            "Hello, World!"
        );
    }

    #[test]
    fn whitespace() {
        let marks = Marks::sentinels();
        let t = Truncation::new(5);
        assert_eq!(excerpt(&t, &marks, "  \t Hello"), "Hello");
        assert_eq!(excerpt(&t, &marks, "Hello   "), "Hello…");
        assert_eq!(excerpt(&t, &marks, "Hel  lo"), "Hel…");
        assert_eq!(excerpt(&t, &marks, " \n "), "_BLANK_");
        assert_eq!(excerpt(&t, &marks, ""), "_BLANK_");
        assert_eq!(excerpt(&Truncation::new(0), &marks, "\u{a0}x\u{2003}"), "x");
        assert_eq!(excerpt(&t, &marks, "\u{2003}\u{a0}\u{3000}"), "_BLANK_");
        assert_eq!(excerpt(&Truncation::new(0), &marks, "\u{3000}\u{2003}"), "_BLANK_");
    }

    #[test]
    fn multibyte() {
        let marks = Marks::sentinels();
        assert_eq!(
            excerpt(&Truncation::new(7), &marks, "Hello, Wörld!"),
            "Hello,…"
        );
        assert_eq!(excerpt(&Truncation::new(9), &marks, "Hello, Wörld!"), "Hello, Wö…");
        assert_eq!(excerpt(&Truncation::new(1), &marks, "日本語"), "日…");

        let mut dst = Vec::new();
        Truncation::new(2).excerpt(b"\xffab", &Marks::new(), &mut dst);
        assert_eq!(dst, b"\xffa");
    }

    #[test]
    fn replacement() {
        let marks = Marks::new();
        let t = Truncation::new(0).replace("\n", "");
        assert_eq!(excerpt(&t, &marks, "Hello,\nWorld!"), "Hello,World!");

        let t = Truncation::new(12).replace("\n", " ");
        assert_eq!(
            excerpt(&t, &Marks::sentinels(), "Hello,\nWorld!"),
            "Hello, World…"
        );

        let t = Truncation::new(0).replace("!", "");
        assert_eq!(excerpt(&t, &marks, "Hello, World!!!"), "Hello, World");

        let t = Truncation::new(0).replace("foo", "f").replace("bar", "b");
        assert_eq!(excerpt(&t, &marks, "foobar"), "fb");

        let t = Truncation::new(0).replace("f", "foo").replace("b", "bar");
        assert_eq!(excerpt(&t, &marks, "fb"), "foobar");

        let t = Truncation::new(0).replace("foo", "").replace("bar", "");
        assert_eq!(excerpt(&t, &marks, "foobar foobar"), " ");

        let t = Truncation::new(0).replace("", "x").replace("a", "a");
        assert_eq!(excerpt(&t, &marks, "abc"), "abc");

        // No-op rules don't get in the way of the rules that do something
        let t = Truncation::new(0)
            .replace("", "x")
            .replace("a", "a")
            .replace("b", "B");
        assert_eq!(excerpt(&t, &marks, "abc"), "aBc");

        // replacements apply after truncation
        let t = Truncation::new(3).replace("o", "0");
        assert_eq!(excerpt(&t, &marks, "foo bar"), "f00");
    }

    #[test]
    fn appends() {
        let mut dst = b"prefix:".to_vec();
        Truncation::new(3)
            .replace("p", "q")
            .excerpt(b"pop", &Marks::new(), &mut dst);
        assert_eq!(dst, b"prefix:qoq");
    }
}
