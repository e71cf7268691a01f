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

//! Write records to stdout, both directly & via `tracing`, then read them back.

use jsonline::{
    excerpt::Marks,
    kv::Kv,
    layer::Layer,
    log::Log,
    record::{LocationMode, Slot},
    sink::WriterSink,
    value::Value,
};
use tracing::info;
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::io::Write;

pub fn main() {
    let log = Log::builder(WriterSink::stdout())
        .key(Slot::Original, "message")
        .key(Slot::Excerpt, "excerpt")
        .key(Slot::Trail, "trail")
        .key(Slot::Location, "file")
        .marks(Marks::sentinels())
        .truncate(40)
        .replace("\n", " ")
        .location(LocationMode::ShortFile)
        .kv("app", "stdout-test")
        .build();

    let request = log.with([
        Kv::new("request", 17),
        Kv::any("elapsed", std::time::Duration::from_micros(1500)),
        Kv::new("raw", Value::raw(r#"{"nested":[1,2,3]}"#)),
    ]);
    request.print("main.rs:1: Handling request").unwrap();
    request.write(None::<&[u8]>).unwrap();
    let mut w = &request;
    w.write_all(b"main.rs:2: Multi-line\nmessage, long enough to need an excerpt\n")
        .unwrap();

    // Records that fail to encode are never written
    let err = log
        .with([Kv::new("nan", f64::NAN)])
        .print("main.rs:3: never seen")
        .unwrap_err();
    eprintln!("expected failure: {}", err);

    let subscriber = Registry::default().with(Layer::new(log).with_target("target"));
    let _guard = tracing::subscriber::set_default(subscriber);
    info!(user = "jdoe", "Hello, 世界!");
}
