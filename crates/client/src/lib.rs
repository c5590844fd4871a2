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

//! lineflux client library
//!
//! Writes time-series points in the text line protocol to a metrics
//! database.
//!
//! # Features
//!
//! - **Direct mode**: every write is encoded and sent right away
//! - **Aggregation mode**: writes are grouped by measurement and tag set and
//!   flushed on a fixed interval by a background task
//! - **Pluggable merge policy**: decide how lines of the same series are
//!   combined before a flush
//! - **Transports**: HTTP (`/write?db=`), UDP datagrams, stdout and an
//!   in-memory sink
//! - **Comprehensive Error Handling**: Using snafu for structured error types
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use lineflux_client::{Client, ClientOptions, DispatchMode, Fields, HttpSink, Tags, Timestamp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(HttpSink::new("http://localhost:8086", "metrics")?);
//!     let options = ClientOptions::builder()
//!         .prefix("app.")
//!         .mode(DispatchMode::Aggregate)
//!         .flush_interval(Duration::from_secs(10))
//!         .build();
//!     let client = Client::new(options, sink)?;
//!
//!     let tags = Tags::from([("host".to_string(), "web-1".to_string())]);
//!     client
//!         .write("requests", Fields::from([("count", 1.0)]), tags, Timestamp::Now)
//!         .await?;
//!
//!     // Send whatever is still pending before exiting.
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Delivery
//!
//! Transport failures are logged by the transport and the line is dropped.
//! There is no retry; wrap the [`Sink`] if stronger guarantees are needed.
//! Lines being sent when the client is dropped without [`Client::close`]
//! may be lost.

pub mod aggregate;
pub mod client;
pub mod http;
pub mod options;
pub mod scheduler;
pub mod sink;
pub mod types;
pub mod udp;

// Re-export the main client types
pub use aggregate::{AggregationStore, Append, KeepLatest, Merge};
pub use client::Client;
pub use http::HttpSink;
pub use lineflux_protocol::{EncodeError, FieldValue, Fields, IdentityKey, Integer, Point, Tags};
pub use options::{ClientOptions, DEFAULT_FLUSH_INTERVAL, DispatchMode};
pub use scheduler::{FlushScheduler, Flusher};
pub use sink::{MemorySink, Sink, SinkConfig, StdoutSink};
pub use types::{ClientError, ClientResult, FlushStats, Timestamp};
pub use udp::UdpSink;
