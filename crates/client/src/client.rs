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

use lineflux_protocol::{Fields, Tags, encode_line};
use snafu::{ResultExt, ensure};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::{
    aggregate::{Append, AggregationStore, Merge},
    options::{ClientOptions, DispatchMode},
    scheduler::{FlushScheduler, Flusher},
    sink::Sink,
    types::{ClientResult, FlushStats, InvalidArgumentSnafu, NoRuntimeSnafu, Timestamp},
};

/// Entry point for writing points.
///
/// In [`DispatchMode::Direct`] every write is encoded and handed to the sink
/// before `write` returns. In [`DispatchMode::Aggregate`] writes are grouped
/// by identity key and a background task flushes them every
/// `flush_interval`.
///
/// The client is `Send + Sync`; share it behind an `Arc` to write from many
/// tasks at once.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use lineflux_client::{Client, ClientOptions, MemorySink, Tags, Timestamp};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = Arc::new(MemorySink::new());
///     let options = ClientOptions::builder().prefix("app.").build();
///     let client = Client::new(options, sink.clone())?;
///
///     client.write("requests", 10.0, Tags::new(), Timestamp::Absent).await?;
///     assert_eq!(sink.lines(), vec!["app.requests value=10"]);
///     Ok(())
/// }
/// ```
pub struct Client {
    options:  ClientOptions,
    dispatch: Dispatch,
}

enum Dispatch {
    Direct {
        sink: Arc<dyn Sink>,
    },
    Aggregate {
        store:     Arc<AggregationStore>,
        flusher:   Arc<Flusher>,
        scheduler: Mutex<Option<FlushScheduler>>,
    },
}

impl Client {
    /// Creates a client. In aggregation mode lines of the same identity key
    /// are appended in arrival order.
    ///
    /// Aggregation mode spawns the flush task on the current tokio runtime.
    ///
    /// # Errors
    /// In aggregation mode, returns a `ClientError` if the flush interval is
    /// zero or if there is no tokio runtime to run the flush task on.
    pub fn new(options: ClientOptions, sink: Arc<dyn Sink>) -> ClientResult<Self> {
        Self::with_merge(options, sink, Append)
    }

    /// Creates a client using `merge` to combine lines of the same identity
    /// key. The policy is ignored in direct mode.
    pub fn with_merge(
        options: ClientOptions,
        sink: Arc<dyn Sink>,
        merge: impl Merge,
    ) -> ClientResult<Self> {
        info!(
            "Creating client in {} mode with prefix '{}'",
            options.mode, options.prefix
        );

        let dispatch = match options.mode {
            DispatchMode::Direct => Dispatch::Direct { sink },
            DispatchMode::Aggregate => {
                ensure!(
                    !options.flush_interval.is_zero(),
                    InvalidArgumentSnafu {
                        message: "Flush interval must be greater than zero",
                    }
                );
                Handle::try_current().context(NoRuntimeSnafu)?;
                let store = Arc::new(AggregationStore::with_merge(merge));
                let flusher = Arc::new(Flusher::new(store.clone(), sink));
                let scheduler = FlushScheduler::start(flusher.clone(), options.flush_interval);
                Dispatch::Aggregate {
                    store,
                    flusher,
                    scheduler: Mutex::new(Some(scheduler)),
                }
            }
        };

        Ok(Self { options, dispatch })
    }

    pub fn options(&self) -> &ClientOptions { &self.options }

    /// Writes one point.
    ///
    /// * `values` - the fields; a bare number is written as the single field
    ///   `value`
    /// * `tags` - merged over the default tags, these win on conflict
    /// * `timestamp` - `Timestamp::Now`, `Timestamp::Absent` or explicit
    ///   nanoseconds
    ///
    /// The configured prefix is prepended to `measurement`.
    ///
    /// # Errors
    /// Returns a `ClientError` if the point cannot be encoded. Nothing is
    /// recorded or sent in that case. Transport failures are not reported.
    pub async fn write(
        &self,
        measurement: &str,
        values: impl Into<Fields>,
        tags: Tags,
        timestamp: Timestamp,
    ) -> ClientResult<()> {
        let fields = values.into();
        let timestamp = timestamp.resolve();
        let measurement = format!("{}{}", self.options.prefix, measurement);

        let mut all_tags = self.options.default_tags.clone();
        all_tags.extend(tags);

        match &self.dispatch {
            Dispatch::Direct { sink } => {
                let line = encode_line(&measurement, &all_tags, &fields, timestamp)?;
                debug!("Sending line for {}", measurement);
                sink.send(&line).await;
            }
            Dispatch::Aggregate { store, .. } => {
                store.record(&measurement, &all_tags, &fields, timestamp)?;
                debug!("Recorded line for {}", measurement);
            }
        }
        Ok(())
    }

    /// Sends everything pending now. Waits for a scheduled flush in progress
    /// to finish first. A no-op in direct mode.
    pub async fn flush(&self) -> FlushStats {
        match &self.dispatch {
            Dispatch::Direct { .. } => FlushStats::default(),
            Dispatch::Aggregate { flusher, .. } => flusher.flush().await,
        }
    }

    /// Number of lines waiting for the next flush
    pub fn pending_lines(&self) -> usize {
        match &self.dispatch {
            Dispatch::Direct { .. } => 0,
            Dispatch::Aggregate { store, .. } => store.pending_lines(),
        }
    }

    /// Stops the flush task and sends whatever is still pending.
    ///
    /// Writes made after `close` stay pending until the next explicit
    /// [`flush`](Self::flush).
    pub async fn close(&self) -> FlushStats {
        let Dispatch::Aggregate { scheduler, .. } = &self.dispatch else {
            return FlushStats::default();
        };

        let scheduler = scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(scheduler) = scheduler {
            info!("Shutting down flush scheduler...");
            scheduler.shutdown();
            scheduler.wait_for_stop().await;
        }

        let stats = self.flush().await;
        info!("Client closed after flushing {} lines", stats.lines);
        stats
    }
}
