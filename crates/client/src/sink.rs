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

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{http::HttpSink, types::ClientResult, udp::UdpSink};

/// Destination for finished protocol lines.
///
/// Sending is fire-and-forget: nothing is reported back to the caller.
/// Implementations own their failure handling (typically a `warn!` log) and
/// must not retry on behalf of the client. A failed line must not affect the
/// lines sent after it.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn send(&self, line: &str);
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn send(&self, line: &str) { (**self).send(line).await }
}

/// Keeps every line in memory. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    /// Returns a copy of everything received so far
    pub fn lines(&self) -> Vec<String> { self.lock().clone() }

    /// Returns and forgets everything received so far
    pub fn take(&self) -> Vec<String> { std::mem::take(&mut *self.lock()) }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn send(&self, line: &str) { self.lock().push(line.to_string()); }
}

/// Prints every line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn send(&self, line: &str) { println!("{line}"); }
}

/// Transport selection, as found in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// POST each line to `<url>/write?db=<database>`
    Http { url: String, database: String },
    /// One datagram per line to `<server>:<port>`
    Udp { server: String, port: u16 },
    #[default]
    Stdout,
}

impl SinkConfig {
    /// Builds the configured transport.
    pub async fn connect(&self) -> ClientResult<Arc<dyn Sink>> {
        let sink: Arc<dyn Sink> = match self {
            SinkConfig::Http { url, database } => Arc::new(HttpSink::new(url, database)?),
            SinkConfig::Udp { server, port } => Arc::new(UdpSink::connect(server, *port).await?),
            SinkConfig::Stdout => Arc::new(StdoutSink),
        };
        Ok(sink)
    }
}
