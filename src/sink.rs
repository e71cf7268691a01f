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

//! Where records go.
//!
//! This module defines the [`Sink`] trait that every destination must support, along with
//! implementations for UDP, TCP, Unix sockets & anything that implements [`std::io::Write`].
//!
//! Each call to [`Sink::send`] carries exactly one complete record, newline included, so
//! datagram sinks send one record per datagram & stream sinks need add no framing of their own.
//!
//! # Examples
//!
//! To send records over UDP to a GELF input listening on port 12201 (the default) on localhost:
//!
//! ```rust
//! use jsonline::sink::UdpSink;
//! let sink = UdpSink::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use jsonline::sink::UdpSink;
//! let sink = UdpSink::new("some-host.domain.io:5514");
//! assert!(sink.is_err()); // no such host, after all
//! ```
//!
//! To standard error:
//!
//! ```rust
//! use jsonline::sink::WriterSink;
//! let sink = WriterSink::stderr();
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use std::{io::Write, net::TcpStream, sync::Arc};

#[cfg(target_os = "linux")]
use std::{
    os::unix::net::{UnixDatagram, UnixStream},
    path::Path,
};

fn write_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Write {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           trait Sink                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all sinks must support.
pub trait Sink {
    /// Deliver one complete record.
    ///
    /// Implementations must deliver `buf` as a unit: a concurrent call may not interleave its bytes
    /// with these.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

impl<K: Sink + ?Sized> Sink for Arc<K> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.as_ref().send(buf)
    }
}

/// Sending records via UDP datagrams.
pub struct UdpSink {
    socket: std::net::UdpSocket,
}

impl UdpSink {
    /// Construct a [`Sink`] implementation via UDP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<UdpSink> {
        // Bind to any available port on localhost...
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").map_err(write_error)?;
        // and connect to the collector at `addr`:
        socket.connect(addr).map_err(write_error)?;
        trace!("UDP sink bound to {:?}", socket.local_addr());
        Ok(UdpSink { socket })
    }
    /// Construct a [`Sink`] implementation via UDP at localhost:12201 (the GELF default)
    pub fn local() -> Result<UdpSink> {
        UdpSink::new("localhost:12201")
    }
}

impl Sink for UdpSink {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(write_error)
    }
}

/// Sending records via a TCP stream
pub struct TcpSink {
    socket: Mutex<TcpStream>,
}

impl TcpSink {
    /// Construct a [`Sink`] implementation via TCP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<TcpSink> {
        Ok(TcpSink {
            socket: Mutex::new(TcpStream::connect(addr).map_err(write_error)?),
        })
    }
    /// Construct a [`Sink`] implementation via TCP at localhost:12201
    pub fn try_default() -> Result<TcpSink> {
        TcpSink::new("localhost:12201")
    }
}

impl Sink for TcpSink {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        // A record may take more than one `write()`; hold the lock throughout so that concurrent
        // records don't interleave on the wire.
        let mut socket = self.socket.lock();
        socket.write_all(buf).map_err(write_error)?;
        socket.flush().map_err(write_error)?;
        Ok(buf.len())
    }
}

/// Sending records via Unix socket (datagram)
#[cfg(target_os = "linux")]
pub struct UnixSocket {
    socket: UnixDatagram,
}

#[cfg(target_os = "linux")]
impl UnixSocket {
    /// Construct a [`Sink`] implementation via Unix datagram sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocket> {
        let sock = UnixDatagram::unbound().map_err(write_error)?;
        sock.connect(path).map_err(write_error)?;
        Ok(UnixSocket { socket: sock })
    }
}

#[cfg(target_os = "linux")]
impl Sink for UnixSocket {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(write_error)
    }
}

/// Sending records via Unix socket (stream)
#[cfg(target_os = "linux")]
pub struct UnixSocketStream {
    socket: Mutex<UnixStream>,
}

#[cfg(target_os = "linux")]
impl UnixSocketStream {
    /// Construct a [`Sink`] implementation via Unix sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocketStream> {
        Ok(UnixSocketStream {
            socket: Mutex::new(UnixStream::connect(path).map_err(write_error)?),
        })
    }
}

#[cfg(target_os = "linux")]
impl Sink for UnixSocketStream {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        let mut socket = self.socket.lock();
        socket.write_all(buf).map_err(write_error)?;
        socket.flush().map_err(write_error)?;
        Ok(buf.len())
    }
}

/// Sending records to anything implementing [`std::io::Write`]: a file, a pipe, a `Vec<u8>`...
pub struct WriterSink<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> WriterSink<W> {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }
    /// Lock the underlying writer; handy for inspecting what's been written so far
    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.writer.lock()
    }
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> WriterSink<std::io::Stdout> {
        WriterSink::new(std::io::stdout())
    }
}

impl WriterSink<std::io::Stderr> {
    pub fn stderr() -> WriterSink<std::io::Stderr> {
        WriterSink::new(std::io::stderr())
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        let mut writer = self.writer.lock();
        writer.write_all(buf).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
        Ok(buf.len())
    }
}
