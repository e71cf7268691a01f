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

//! Key/value pairs
//!
//! A [`Kv`] pairs two [`Value`]s; the key is rendered via its text form (so any kind of [`Value`]
//! can serve as a key) and the value via its JSON form.

use crate::{error::Result, value::Value};

use std::{fmt::Debug, sync::Arc};

/// A single annotation
#[derive(Clone, Debug)]
pub struct Kv {
    key: Value,
    value: Value,
}

/// An annotation computed afresh for every record
pub type ComputedKv = Arc<dyn Fn() -> Kv + Send + Sync>;

impl Kv {
    pub fn new<K: Into<Value>, V: Into<Value>>(key: K, value: V) -> Kv {
        Kv {
            key: key.into(),
            value: value.into(),
        }
    }
    /// Pair `key` with an arbitrary value; see [`Value::any`]
    pub fn any<K, V>(key: K, value: V) -> Kv
    where
        K: Into<Value>,
        V: serde::Serialize + Debug + Send + Sync + 'static,
    {
        Kv::new(key, Value::any(value))
    }
    /// Pair `key` with a value that will always take the structural encoding; see
    /// [`Value::reflect`]
    pub fn reflect<K, V>(key: K, value: V) -> Kv
    where
        K: Into<Value>,
        V: serde::Serialize + Debug + Send + Sync + 'static,
    {
        Kv::new(key, Value::reflect(value))
    }
    /// Pair `key` with a value computed when the record is assembled
    pub fn lazy<K, F>(key: K, f: F) -> Kv
    where
        K: Into<Value>,
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Kv::new(key, Value::lazy(f))
    }
    pub fn key(&self) -> &Value {
        &self.key
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    pub fn into_value(self) -> Value {
        self.value
    }
    /// The key, as the text under which it will appear in a record
    pub fn key_text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.key.text()?).into_owned())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<(K, V)> for Kv {
    fn from(kv: (K, V)) -> Self {
        Kv::new(kv.0, kv.1)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn keys_are_text() {
        assert_eq!(Kv::new("foo", 1).key_text().unwrap(), "foo");
        assert_eq!(Kv::new(42, "bar").key_text().unwrap(), "42");
        assert_eq!(Kv::new(None::<String>, "bar").key_text().unwrap(), "null");
        assert_eq!(Kv::from((b"b\"az".to_vec(), 1)).key_text().unwrap(), "b\"az");
        assert_eq!(Kv::reflect("foo", 1).key_text().unwrap(), "foo");
    }

    #[test]
    fn values_are_json() {
        assert_eq!(Kv::new("foo", "bar").value().json().unwrap(), b"\"bar\"");
        assert_eq!(Kv::any("foo", Some(42u8)).value().json().unwrap(), b"42");
        assert_eq!(
            Kv::lazy("foo", || Value::from(true)).value().json().unwrap(),
            b"true"
        );
    }
}
