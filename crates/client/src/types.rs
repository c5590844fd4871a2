// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use lineflux_protocol::EncodeError;
use snafu::Snafu;

/// Common result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    /// The point could not be encoded; nothing was recorded or sent
    #[snafu(transparent)]
    Encode { source: EncodeError },

    /// HTTP client construction error
    #[snafu(display("HTTP error: {source}"))]
    Http { source: reqwest::Error },

    /// URL parsing error
    #[snafu(display("Invalid URL: {source}"))]
    InvalidUrl { source: url::ParseError },

    /// UDP socket setup error
    #[snafu(display("Failed to open UDP socket for {addr}: {source}"))]
    UdpSocket {
        addr:   String,
        source: std::io::Error,
    },

    /// Invalid argument error
    #[snafu(display("Invalid argument: {message}"))]
    InvalidArgument { message: String },

    /// Aggregation mode was requested outside a tokio runtime
    #[snafu(display("Aggregation mode requires a tokio runtime: {source}"))]
    NoRuntime {
        source: tokio::runtime::TryCurrentError,
    },
}

/// Timestamp of a written point.
///
/// `Now` is the default and stamps the point with the current wall-clock
/// time (millisecond precision, expressed in nanoseconds). `Absent` writes
/// the line without a timestamp so the server assigns one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timestamp {
    #[default]
    Now,
    Absent,
    /// Explicit nanoseconds since the Unix epoch
    Nanos(i64),
}

impl Timestamp {
    /// Resolves to the value written on the wire.
    pub fn resolve(self) -> Option<i64> {
        match self {
            Timestamp::Now => Some(lineflux_common::now_nanos()),
            Timestamp::Absent => None,
            Timestamp::Nanos(ns) => Some(ns),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ns: i64) -> Self { Timestamp::Nanos(ns) }
}

impl From<Option<i64>> for Timestamp {
    fn from(ns: Option<i64>) -> Self { ns.map_or(Timestamp::Absent, Timestamp::Nanos) }
}

/// Outcome of one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Number of identity keys drained
    pub keys:  usize,
    /// Number of lines handed to the sink
    pub lines: usize,
}
