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
//! [jsonline](crate) errors

use backtrace::Backtrace;

/// [jsonline](crate) error type
///
/// [jsonline](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis what the caller will need
/// to repond. Broadly, there are two things that can go wrong when emitting a record: one of its
/// values can't be rendered as JSON (the "encode" family: [`Error::Encode`], [`Error::RawJson`] &
/// [`Error::NonFinite`]), or the sink refuses the bytes ([`Error::Write`]). In neither case is a
/// partial record written.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// The generic (structural) encoder could not represent a value
    Encode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A raw (pre-encoded) JSON value was malformed
    RawJson {
        source: serde_json::Error,
        back: Backtrace,
    },
    /// JSON has no representation for NaN or the infinities
    NonFinite { value: f64, back: Backtrace },
    /// Failed to discover a hostname for the GELF `host` field
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The sink failed to accept a record
    Write {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    /// True if this error arose while rendering a value (as opposed to delivering the record)
    pub fn is_encode(&self) -> bool {
        matches!(
            self,
            Error::Encode { .. } | Error::RawJson { .. } | Error::NonFinite { .. }
        )
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Encode { source, .. } => write!(f, "While encoding a value, got {}", source),
            Error::RawJson { source, .. } => write!(f, "Malformed raw JSON value: {}", source),
            Error::NonFinite { value, .. } => {
                write!(f, "{} has no JSON representation", value)
            }
            Error::NoHostname { source, .. } => {
                write!(f, "Couldn't discover a hostname: {}", source)
            }
            Error::Write { source, .. } => write!(f, "While writing a record, got {}", source),
            _ => write!(f, "Other jsonline error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Encode { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::RawJson { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::NonFinite { value: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::NoHostname { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Write { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "jsonline error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    #[allow(unreachable_patterns)]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encode { source, .. } => Some(source.as_ref()),
            Error::RawJson { source, .. } => Some(source),
            Error::NoHostname { source, .. } => Some(source.as_ref()),
            Error::Write { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
