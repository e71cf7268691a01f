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

//! Values that know how to render themselves
//! =========================================
//!
//! # Introduction
//!
//! Everything that ends up in a record-- every key, every annotation value, the message itself--
//! is a [`Value`]. A [`Value`] has two renderings, and they must agree on what they represent:
//!
//! 1. its "text" form ([`Value::text`]): the plain, unescaped rendering; this is what is used when
//!    a [`Value`] serves as a key
//!
//! 2. its JSON form ([`Value::json`]): a single JSON token; this is what lands in the record when
//!    the [`Value`] is a value
//!
//! For strings, byte strings & rune sequences the text form is the raw content while the JSON form
//! is a properly escaped JSON string.
//!
//! # Null, pointers & empty sequences
//!
//! Any kind may be supplied through an [`Option`] (or a [`Box`], or an [`Arc`]); `None` renders as
//! `null` in both forms and is never an error. `Some` empty sequence is _not_ `None`, however: it
//! renders as the empty string.
//!
//! ```rust
//! use jsonline::value::Value;
//! assert_eq!(Value::from(None::<Vec<u8>>).json().unwrap(), b"null");
//! assert_eq!(Value::from(Some(Vec::<u8>::new())).json().unwrap(), b"\"\"");
//! ```
//!
//! # Dynamic values
//!
//! [`Value::any`] accepts anything [`Serialize`] + [`Debug`] and checks it against the closed set
//! of kinds [`Value`] knows about (looking through `Option`, `Box` & `Arc` along the way, however
//! deep). If nothing matches, it falls back on the generic structural encoding (the
//! [`Value::Reflect`] arm), which uses [`serde`] for both forms; strings still read raw in the
//! text form. [`Value::reflect`] goes straight to that arm, even for kinds that have a dedicated
//! variant, which can make a difference:
//!
//! ```rust
//! use jsonline::value::{Complex64, Value};
//! use std::time::Duration;
//! let d = Duration::from_nanos(42);
//! assert_eq!(Value::any(d).json().unwrap(), b"\"42ns\"");
//! assert_eq!(Value::reflect(d).json().unwrap(), br#"{"secs":0,"nanos":42}"#);
//! // JSON has nothing to say about complex numbers
//! assert!(Value::reflect(Complex64::new(1.0, 23.0)).json().is_err());
//! ```
//!
//! [`Serialize`]: serde::Serialize
//! [`Debug`]: std::fmt::Debug

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::BufMut;
use chrono::prelude::*;

use std::{any::Any, fmt::Debug, sync::Arc, time::Duration};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        complex numbers                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A complex number
///
/// There's no complex type in `std`, and this crate only needs to _render_ them, so this is just
/// a pair. It implements [`serde::Serialize`] only so that it can travel through the generic
/// encoding path, where it will always fail: JSON has no representation for it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Complex<T> {
        Complex { re, im }
    }
}

/// Complex number with `f32` components
pub type Complex32 = Complex<f32>;
/// Complex number with `f64` components
pub type Complex64 = Complex<f64>;

macro_rules! complex_display {
    ($($t:ty),*) => {
        $(
            impl std::fmt::Display for Complex<$t> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.re)?;
                    if self.im.is_sign_negative() {
                        write!(f, "{}i", self.im)
                    } else {
                        write!(f, "+{}i", self.im)
                    }
                }
            }
        )*
    };
}

complex_display!(f32, f64);

impl<T> serde::Serialize for Complex<T> {
    fn serialize<S: serde::Serializer>(
        &self,
        _serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom(
            "unsupported type: complex number",
        ))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          enum Value                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Anything that can take the generic (structural) encoding path. [`Debug`] is the text form of
/// last resort, for values [`serde_json`] can't represent.
pub trait Reflect: Debug + Send + Sync {
    fn as_serialize(&self) -> &dyn erased_serde::Serialize;
}

impl<T> Reflect for T
where
    T: serde::Serialize + Debug + Send + Sync,
{
    fn as_serialize(&self) -> &dyn erased_serde::Serialize {
        self
    }
}

/// A single key or value, able to render itself as plain text & as JSON
#[derive(Clone)]
pub enum Value {
    /// `null` in both renderings
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Complex32(Complex32),
    Complex64(Complex64),
    Str(String),
    Bytes(Vec<u8>),
    Runes(Vec<char>),
    Duration(Duration),
    Time(DateTime<FixedOffset>),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    /// Pre-encoded JSON, passed through (after validation)
    Raw(Vec<u8>),
    /// Generic structural encoding
    Reflect(Arc<dyn Reflect>),
    /// Computed when the record is assembled
    Lazy(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(x) => write!(f, "Bool({:?})", x),
            Value::I8(x) => write!(f, "I8({:?})", x),
            Value::I16(x) => write!(f, "I16({:?})", x),
            Value::I32(x) => write!(f, "I32({:?})", x),
            Value::I64(x) => write!(f, "I64({:?})", x),
            Value::Isize(x) => write!(f, "Isize({:?})", x),
            Value::U8(x) => write!(f, "U8({:?})", x),
            Value::U16(x) => write!(f, "U16({:?})", x),
            Value::U32(x) => write!(f, "U32({:?})", x),
            Value::U64(x) => write!(f, "U64({:?})", x),
            Value::Usize(x) => write!(f, "Usize({:?})", x),
            Value::F32(x) => write!(f, "F32({:?})", x),
            Value::F64(x) => write!(f, "F64({:?})", x),
            Value::Complex32(x) => write!(f, "Complex32({})", x),
            Value::Complex64(x) => write!(f, "Complex64({})", x),
            Value::Str(x) => write!(f, "Str({:?})", x),
            Value::Bytes(x) => write!(f, "Bytes({:?})", String::from_utf8_lossy(x)),
            Value::Runes(x) => write!(f, "Runes({:?})", x.iter().collect::<String>()),
            Value::Duration(x) => write!(f, "Duration({:?})", x),
            Value::Time(x) => write!(f, "Time({:?})", x),
            Value::Error(x) => write!(f, "Error({:?})", x.to_string()),
            Value::Raw(x) => write!(f, "Raw({:?})", String::from_utf8_lossy(x)),
            Value::Reflect(x) => write!(f, "Reflect({:?})", x),
            Value::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

impl Value {
    /// Wrap `value` for the generic structural encoding, regardless of its type
    pub fn reflect<T>(value: T) -> Value
    where
        T: serde::Serialize + Debug + Send + Sync + 'static,
    {
        Value::Reflect(Arc::new(value))
    }

    /// Wrap an error; it renders as its [`Display`](std::fmt::Display) implementation
    pub fn error<E>(err: E) -> Value
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Value::Error(Arc::new(err))
    }

    /// Wrap bytes that are already JSON
    pub fn raw<B: Into<Vec<u8>>>(bytes: B) -> Value {
        Value::Raw(bytes.into())
    }

    /// Defer computing a value until the record is assembled
    pub fn lazy<F>(f: F) -> Value
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Value::Lazy(Arc::new(f))
    }

    /// Inspect `value` against the kinds [`Value`] knows & delegate to the matching variant; fall
    /// back to [`Value::reflect`] if none match.
    ///
    /// Known kinds are recognized bare & behind up to two levels of `Option`, `Box` or `Arc`.
    /// Past that, `value` is followed through [`serde`], which treats those wrappers as
    /// transparent, so that a scalar or string at any depth still gets its own variant. `()` and
    /// `None` (at any depth) are `null`.
    pub fn any<T>(value: T) -> Value
    where
        T: serde::Serialize + Debug + Send + Sync + 'static,
    {
        let any: &dyn Any = &value;

        macro_rules! known {
            (@shape $s:ty) => {
                if let Some(x) = any.downcast_ref::<$s>() {
                    return Value::from(x.clone());
                }
            };
            ($($t:ty),* $(,)?) => {
                $(
                    known!(@shape $t);
                    known!(@shape Option<$t>);
                    known!(@shape Box<$t>);
                    known!(@shape Arc<$t>);
                    known!(@shape Option<Option<$t>>);
                    known!(@shape Option<Box<$t>>);
                    known!(@shape Option<Arc<$t>>);
                    known!(@shape Box<Option<$t>>);
                    known!(@shape Box<Box<$t>>);
                    known!(@shape Box<Arc<$t>>);
                    known!(@shape Arc<Option<$t>>);
                    known!(@shape Arc<Box<$t>>);
                    known!(@shape Arc<Arc<$t>>);
                )*
            };
        }

        known!(
            bool,
            i8,
            i16,
            i32,
            i64,
            isize,
            u8,
            u16,
            u32,
            u64,
            usize,
            f32,
            f64,
            Complex32,
            Complex64,
            String,
            &'static str,
            Vec<u8>,
            &'static [u8],
            Vec<char>,
            Duration,
            DateTime<Utc>,
            DateTime<FixedOffset>,
            DateTime<Local>,
        );

        match serde::Serialize::serialize(&value, Peel) {
            Ok(peeled) => peeled,
            Err(Compound) => Value::reflect(value),
        }
    }

    /// Evaluate any [`Value::Lazy`] wrappers; every other variant is returned as-is
    pub fn resolve(self) -> Value {
        let mut value = self;
        while let Value::Lazy(f) = value {
            value = f();
        }
        value
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as plain text
    pub fn text(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_text(&mut buf)?;
        Ok(buf)
    }

    /// Render this value as a single JSON token
    pub fn json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        Ok(buf)
    }

    /// Append the plain-text rendering of this value to `buf`
    pub fn write_text(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Null => buf.put_slice(b"null"),
            Value::Bool(x) => buf.put_slice(if *x { b"true" } else { b"false" }),
            Value::I8(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::I16(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::I32(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::I64(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::Isize(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::U8(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::U16(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::U32(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::U64(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::Usize(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::F32(x) => buf.put_slice(format_float(*x as f64, x.to_string()).as_bytes()),
            Value::F64(x) => buf.put_slice(format_float(*x, x.to_string()).as_bytes()),
            Value::Complex32(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::Complex64(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::Str(x) => buf.put_slice(x.as_bytes()),
            Value::Bytes(x) => buf.put_slice(x),
            Value::Runes(x) => buf.put_slice(x.iter().collect::<String>().as_bytes()),
            Value::Duration(x) => buf.put_slice(format_duration(*x).as_bytes()),
            Value::Time(x) => buf.put_slice(format_time(x).as_bytes()),
            Value::Error(x) => buf.put_slice(x.to_string().as_bytes()),
            Value::Raw(x) => buf.put_slice(x),
            Value::Reflect(x) => match serde_json::to_value(x.as_serialize()) {
                // Strings read raw, like every other string-like variant.
                Ok(serde_json::Value::String(s)) => buf.put_slice(s.as_bytes()),
                Ok(serde_json::Value::Array(_)) | Ok(serde_json::Value::Object(_)) => {
                    // Written directly so that fields keep their declared order.
                    serde_json::to_writer(&mut *buf, x.as_serialize()).map_err(|err| {
                        Error::Encode {
                            source: Box::new(err),
                            back: Backtrace::new(),
                        }
                    })?
                }
                Ok(scalar) => buf.put_slice(scalar.to_string().as_bytes()),
                // Nothing JSON can express; still worth a look.
                Err(_) => buf.put_slice(format!("{:?}", x).as_bytes()),
            },
            Value::Lazy(f) => f().write_text(buf)?,
        }
        Ok(())
    }

    /// Append the JSON rendering of this value to `buf`
    ///
    /// On error, `buf` may hold a partial rendering; the caller is expected to discard it.
    pub fn write_json(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::F32(x) => write_json_float(buf, *x as f64, x.to_string())?,
            Value::F64(x) => write_json_float(buf, *x, x.to_string())?,
            Value::Complex32(x) => write_json_str(buf, &x.to_string())?,
            Value::Complex64(x) => write_json_str(buf, &x.to_string())?,
            Value::Str(x) => write_json_str(buf, x)?,
            Value::Bytes(x) => write_json_str(buf, &String::from_utf8_lossy(x))?,
            Value::Runes(x) => write_json_str(buf, &x.iter().collect::<String>())?,
            Value::Duration(x) => write_json_str(buf, &format_duration(*x))?,
            Value::Time(x) => write_json_str(buf, &format_time(x))?,
            Value::Error(x) => write_json_str(buf, &x.to_string())?,
            Value::Raw(x) => {
                serde_json::from_slice::<serde::de::IgnoredAny>(x).map_err(|err| {
                    Error::RawJson {
                        source: err,
                        back: Backtrace::new(),
                    }
                })?;
                buf.put_slice(x);
            }
            Value::Reflect(x) => {
                serde_json::to_writer(&mut *buf, x.as_serialize()).map_err(|err| {
                    Error::Encode {
                        source: Box::new(err),
                        back: Backtrace::new(),
                    }
                })?
            }
            Value::Lazy(f) => f().write_json(buf)?,
            // null, booleans & integers read the same either way
            _ => self.write_text(buf)?,
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         pointer peeling                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`serde::Serializer`] that looks through `Option`s, smart pointers & newtypes down to a
/// scalar or string. Anything compound is rejected, and left to the structural encoding.
struct Peel;

#[derive(Debug)]
struct Compound;

impl std::fmt::Display for Compound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compound value")
    }
}

impl std::error::Error for Compound {}

impl serde::ser::Error for Compound {
    fn custom<T: std::fmt::Display>(_msg: T) -> Self {
        Compound
    }
}

macro_rules! peel_scalars {
    ($($method:ident: $t:ty => $variant:ident),* $(,)?) => {
        $(
            fn $method(self, v: $t) -> std::result::Result<Value, Compound> {
                Ok(Value::$variant(v))
            }
        )*
    };
}

impl serde::Serializer for Peel {
    type Ok = Value;
    type Error = Compound;
    type SerializeSeq = serde::ser::Impossible<Value, Compound>;
    type SerializeTuple = serde::ser::Impossible<Value, Compound>;
    type SerializeTupleStruct = serde::ser::Impossible<Value, Compound>;
    type SerializeTupleVariant = serde::ser::Impossible<Value, Compound>;
    type SerializeMap = serde::ser::Impossible<Value, Compound>;
    type SerializeStruct = serde::ser::Impossible<Value, Compound>;
    type SerializeStructVariant = serde::ser::Impossible<Value, Compound>;

    peel_scalars!(
        serialize_bool: bool => Bool,
        serialize_i8: i8 => I8,
        serialize_i16: i16 => I16,
        serialize_i32: i32 => I32,
        serialize_i64: i64 => I64,
        serialize_u8: u8 => U8,
        serialize_u16: u16 => U16,
        serialize_u32: u32 => U32,
        serialize_u64: u64 => U64,
        serialize_f32: f32 => F32,
        serialize_f64: f64 => F64,
    );

    fn serialize_char(self, v: char) -> std::result::Result<Value, Compound> {
        Ok(Value::Str(v.to_string()))
    }
    fn serialize_str(self, v: &str) -> std::result::Result<Value, Compound> {
        Ok(Value::Str(v.to_owned()))
    }
    fn serialize_bytes(self, v: &[u8]) -> std::result::Result<Value, Compound> {
        Ok(Value::Bytes(v.to_vec()))
    }
    fn serialize_none(self) -> std::result::Result<Value, Compound> {
        Ok(Value::Null)
    }
    fn serialize_some<T>(self, value: &T) -> std::result::Result<Value, Compound>
    where
        T: ?Sized + serde::Serialize,
    {
        value.serialize(self)
    }
    fn serialize_unit(self) -> std::result::Result<Value, Compound> {
        Ok(Value::Null)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<Value, Compound> {
        Err(Compound)
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> std::result::Result<Value, Compound> {
        Err(Compound)
    }
    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<Value, Compound>
    where
        T: ?Sized + serde::Serialize,
    {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> std::result::Result<Value, Compound>
    where
        T: ?Sized + serde::Serialize,
    {
        Err(Compound)
    }
    fn serialize_seq(
        self,
        _len: Option<usize>,
    ) -> std::result::Result<Self::SerializeSeq, Compound> {
        Err(Compound)
    }
    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, Compound> {
        Err(Compound)
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, Compound> {
        Err(Compound)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, Compound> {
        Err(Compound)
    }
    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> std::result::Result<Self::SerializeMap, Compound> {
        Err(Compound)
    }
    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, Compound> {
        Err(Compound)
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, Compound> {
        Err(Compound)
    }
}

fn format_float(x: f64, finite: String) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x == f64::INFINITY {
        "+Inf".to_owned()
    } else if x == f64::NEG_INFINITY {
        "-Inf".to_owned()
    } else {
        finite
    }
}

// Rust's `Display` for floats never uses an exponent, so finite values are already valid JSON
// numbers.
fn write_json_float(buf: &mut Vec<u8>, x: f64, finite: String) -> Result<()> {
    if !x.is_finite() {
        return Err(Error::NonFinite {
            value: x,
            back: Backtrace::new(),
        });
    }
    buf.put_slice(finite.as_bytes());
    Ok(())
}

fn write_json_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    serde_json::to_writer(&mut *buf, s).map_err(|err| Error::Encode {
        source: Box::new(err),
        back: Backtrace::new(),
    })
}

fn format_time(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Format `d` the way Go formats a `time.Duration`: "42ns", "1.5µs", "2.25ms", "1h2m3.5s"
pub fn format_duration(d: Duration) -> String {
    fn with_fraction(value: u128, unit: u128, digits: usize) -> String {
        let (int, frac) = (value / unit, value % unit);
        if frac == 0 {
            int.to_string()
        } else {
            let frac = format!("{:0width$}", frac, width = digits);
            format!("{}.{}", int, frac.trim_end_matches('0'))
        }
    }

    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos, 1_000, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", with_fraction(nanos, 1_000_000, 6));
    }

    let secs = d.as_secs();
    let (hours, minutes) = (secs / 3600, (secs / 60) % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    let secs = ((secs % 60) as u128) * 1_000_000_000 + d.subsec_nanos() as u128;
    out.push_str(&format!("{}s", with_fraction(secs, 1_000_000_000, 9)));
    out
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          conversions                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(x: $t) -> Self {
                    Value::$variant(x)
                }
            }
        )*
    };
}

value_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    Complex32 => Complex32,
    Complex64 => Complex64,
    String => Str,
    Vec<u8> => Bytes,
    Vec<char> => Runes,
    Duration => Duration,
);

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Str(x.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(x: &[u8]) -> Self {
        Value::Bytes(x.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(x: &[u8; N]) -> Self {
        Value::Bytes(x.to_vec())
    }
}

impl From<&[char]> for Value {
    fn from(x: &[char]) -> Self {
        Value::Runes(x.to_vec())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(x: DateTime<Tz>) -> Self {
        let offset = x.offset().fix();
        Value::Time(x.with_timezone(&offset))
    }
}

/// `None` is `null`
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => x.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Box<T>> for Value {
    fn from(x: Box<T>) -> Self {
        (*x).into()
    }
}

impl<T: Clone + Into<Value>> From<Arc<T>> for Value {
    fn from(x: Arc<T>) -> Self {
        (*x).clone().into()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[derive(serde::Serialize, Debug)]
    struct Person {
        name: &'static str,
        age: u32,
    }

    fn text(v: Value) -> String {
        String::from_utf8(v.text().unwrap()).unwrap()
    }

    fn json(v: Value) -> String {
        String::from_utf8(v.json().unwrap()).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(text(true.into()), "true");
        assert_eq!(json(false.into()), "false");
        assert_eq!(text(42i8.into()), "42");
        assert_eq!(json((-42i64).into()), "-42");
        assert_eq!(json(u64::MAX.into()), "18446744073709551615");
        assert_eq!(json(4.2f32.into()), "4.2");
        assert_eq!(text(0.123456789f32.into()), "0.12345679");
        assert_eq!(json(0.123456789f64.into()), "0.123456789");
        assert_eq!(json(0f64.into()), "0");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(text(f64::NAN.into()), "NaN");
        assert_eq!(text(f32::NEG_INFINITY.into()), "-Inf");
        let err = Value::from(f64::INFINITY).json().unwrap_err();
        assert!(err.is_encode());
    }

    #[test]
    fn complex() {
        assert_eq!(text(Complex64::new(1.0, 23.0).into()), "1+23i");
        assert_eq!(json(Complex32::new(3.0, -21.0).into()), "\"3-21i\"");
        assert_eq!(json(Value::any(Complex64::new(1.0, 23.0))), "\"1+23i\"");
        // The generic path can't cope...
        assert!(Value::reflect(Complex64::new(1.0, 23.0)).json().is_err());
        // though the text form still works.
        assert_eq!(
            text(Value::reflect(Complex64::new(1.0, 23.0))),
            "Complex { re: 1.0, im: 23.0 }"
        );
    }

    #[test]
    fn strings() {
        let v = Value::from("Hello, \"Wörld\"!");
        assert_eq!(text(v.clone()), "Hello, \"Wörld\"!");
        assert_eq!(json(v), r#""Hello, \"Wörld\"!""#);

        assert_eq!(json(Value::from("\u{0}")), r#""\u0000""#);
        assert_eq!(text(Value::from(b"foo")), "foo");
        assert_eq!(json(Value::from(b"{\"foo\":\"bar\"}")), r#""{\"foo\":\"bar\"}""#);
        assert_eq!(json(Value::from("Hello".chars().collect::<Vec<char>>())), "\"Hello\"");
        // Invalid UTF-8 is replaced, not rejected
        assert_eq!(json(Value::from(vec![b'a', 0xff])), "\"a\u{fffd}\"");
    }

    #[test]
    fn null_versus_empty() {
        assert_eq!(text(Value::from(None::<Vec<u8>>)), "null");
        assert_eq!(json(Value::from(None::<Vec<u8>>)), "null");
        assert_eq!(text(Value::from(Some(Vec::<u8>::new()))), "");
        assert_eq!(json(Value::from(Some(Vec::<u8>::new()))), "\"\"");
        assert_eq!(json(Value::from(Some(String::new()))), "\"\"");
        assert_eq!(json(Value::from(Some(Vec::<char>::new()))), "\"\"");

        assert_eq!(json(Value::from(None::<bool>)), "null");
        assert_eq!(json(Value::from(None::<Complex64>)), "null");
        assert_eq!(json(Value::from(None::<Duration>)), "null");
        assert_eq!(text(Value::from(Some(Box::new(true)))), "true");
        assert_eq!(json(Value::from(Some(Arc::new(42u16)))), "42");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(42)), "42ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_micros(2_250)), "2.25ms");
        assert_eq!(format_duration(Duration::from_millis(3_500)), "3.5s");
        assert_eq!(format_duration(Duration::from_secs(90 * 60)), "1h30m0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5s");

        assert_eq!(json(Duration::from_nanos(42).into()), "\"42ns\"");
        assert_eq!(json(Value::reflect(Duration::from_nanos(42))), r#"{"secs":0,"nanos":42}"#);
    }

    #[test]
    fn times() {
        let t = Utc.timestamp_opt(0, 42).unwrap();
        assert_eq!(text(t.into()), "1970-01-01T00:00:00.000000042Z");
        assert_eq!(json(Value::any(t)), "\"1970-01-01T00:00:00.000000042Z\"");
        let t = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2020, 10, 15, 18, 9, 0)
            .unwrap();
        assert_eq!(text(t.into()), "2020-10-15T18:09:00+01:00");
    }

    #[test]
    fn errors() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "something went wrong");
        let v = Value::error(err);
        assert_eq!(text(v.clone()), "something went wrong");
        assert_eq!(json(v), "\"something went wrong\"");
    }

    #[test]
    fn raw() {
        assert_eq!(json(Value::raw(r#"{"foo":"bar"}"#)), r#"{"foo":"bar"}"#);
        assert_eq!(text(Value::raw(r#"xyz{"foo":"bar"}"#)), r#"xyz{"foo":"bar"}"#);
        assert!(Value::raw(r#"xyz{"foo":"bar"}"#).json().is_err());
        assert!(Value::raw(r#"{"foo":"bar""}"#).json().is_err());
        assert!(Value::raw(b"{\"foo\":\"\0xyz\"}".to_vec()).json().is_err());
        assert_eq!(json(Value::from(None::<Vec<u8>>.map(Value::raw))), "null");
    }

    #[test]
    fn dynamic() {
        assert!(Value::any(()).is_null());
        assert_eq!(json(Value::any(false)), "false");
        assert_eq!(json(Value::any("Hello")), "\"Hello\"");
        assert_eq!(json(Value::any(b"Hello, W\xc3\xb6rld!".to_vec())), "\"Hello, Wörld!\"");
        assert_eq!(json(Value::any(Some(Some(42i32)))), "42");
        assert_eq!(json(Value::any(None::<i32>)), "null");
        assert_eq!(text(Value::any(Some(None::<String>))), "null");
        assert_eq!(json(Value::any(Box::new(4.2f64))), "4.2");

        // Not a known kind: falls back to the structural encoding
        let p = Person {
            name: "John Doe",
            age: 42,
        };
        assert_eq!(json(Value::any(p)), r#"{"name":"John Doe","age":42}"#);
        assert_eq!(
            text(Value::any(Person {
                name: "John Doe",
                age: 42
            })),
            r#"{"name":"John Doe","age":42}"#
        );
        assert_eq!(text(Value::any(None::<Person>)), "null");
        assert_eq!(json(Value::any([b'f', b'o', b'o'])), "[102,111,111]");
    }

    #[test]
    fn reflect_ignores_known_kinds() {
        assert_eq!(json(Value::reflect(b"foo".to_vec())), "[102,111,111]");
        assert_eq!(json(Value::reflect("Hello")), "\"Hello\"");
        assert_eq!(text(Value::reflect("Hello, Wörld!")), "Hello, Wörld!");
        assert_eq!(text(Value::reflect(None::<i32>)), "null");
        assert_eq!(text(Value::reflect(Some(true))), "true");
        assert_eq!(text(Value::reflect(Some(Box::new(4.2f64)))), "4.2");
        assert_eq!(text(Value::reflect(b"hi".to_vec())), "[104,105]");
    }

    #[test]
    fn nested_pointers() {
        let v = Value::any(Box::new(Some(true)));
        assert_eq!(text(v.clone()), "true");
        assert_eq!(json(v), "true");
        let v = Value::any(Some(Some(Some(1i32))));
        assert_eq!(text(v.clone()), "1");
        assert_eq!(json(v), "1");
        assert!(Value::any(Some(Some(Some(None::<bool>)))).is_null());
        assert!(Value::any(Box::new(Some(Box::new(None::<String>)))).is_null());
        assert_eq!(text(Value::any(Some(Box::new(Some("Hello"))))), "Hello");
        // Known kinds with their own renderings, behind two levels
        assert_eq!(json(Value::any(Box::new(Some(Duration::from_nanos(42))))), "\"42ns\"");
        assert_eq!(text(Value::any(Some(Arc::new(b"foo".to_vec())))), "foo");
    }

    #[test]
    fn shared_pointers() {
        assert_eq!(text(Value::any(Arc::new(true))), "true");
        assert_eq!(json(Value::any(Arc::new(String::from("Hello")))), "\"Hello\"");
        assert_eq!(json(Value::any(Arc::new(Some(Duration::from_micros(2))))), "\"2µs\"");
        assert!(Value::any(Arc::new(None::<Person>)).is_null());
    }

    #[test]
    fn lazy() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let v = Value::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from("computed")
        });
        let v = v.resolve();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(json(v.clone()), "\"computed\"");
        assert_eq!(text(v), "computed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
