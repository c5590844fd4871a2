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

//! Periodic flushing of the aggregation store.
//!
//! Flushes never overlap. A [`Flusher`] serializes them with an async lock:
//! a scheduled tick that finds a flush in progress is skipped and logged,
//! and ticks missed while a slow flush was running are skipped rather than
//! replayed in a burst. Lines of one key are therefore never reordered or
//! duplicated on the wire.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::{aggregate::AggregationStore, sink::Sink, types::FlushStats};

/// Drains an [`AggregationStore`] into a [`Sink`].
pub struct Flusher {
    store: Arc<AggregationStore>,
    sink:  Arc<dyn Sink>,
    /// Held for the whole duration of a flush
    guard: Mutex<()>,
}

impl Flusher {
    pub fn new(store: Arc<AggregationStore>, sink: Arc<dyn Sink>) -> Self {
        Self {
            store,
            sink,
            guard: Mutex::new(()),
        }
    }

    /// Flushes now, waiting for a flush already in progress to finish first.
    pub async fn flush(&self) -> FlushStats {
        let _guard = self.guard.lock().await;
        self.flush_locked().await
    }

    /// Flushes now unless a flush is already in progress, in which case
    /// `None` is returned and nothing is drained.
    pub async fn try_flush(&self) -> Option<FlushStats> {
        let _guard = self.guard.try_lock().ok()?;
        Some(self.flush_locked().await)
    }

    async fn flush_locked(&self) -> FlushStats {
        let batches = self.store.drain_all();
        let mut stats = FlushStats {
            keys:  batches.len(),
            lines: 0,
        };

        // Each line is sent on its own; a failing or panicking send does not
        // stop the rest of the batch.
        for (key, lines) in batches {
            debug!("Flushing {} lines for {}", lines.len(), key);
            for line in lines {
                let sent = AssertUnwindSafe(self.sink.send(&line)).catch_unwind().await;
                if sent.is_err() {
                    warn!("Sink panicked while sending a line for {}, dropping it", key);
                }
                stats.lines += 1;
            }
        }
        stats
    }
}

/// Handle of the background flush task.
///
/// The task ticks every `interval` until [`shutdown`](Self::shutdown) is
/// called or the handle is dropped. Sends already in progress when the
/// handle is dropped may be cut short.
pub struct FlushScheduler {
    /// Join handle for the flush task
    join_handle:        JoinHandle<()>,
    /// Token for signalling shutdown
    cancellation_token: CancellationToken,
    /// Cancels the task when the handle goes away
    _cancel_on_drop:    DropGuard,
}

impl FlushScheduler {
    /// Spawns the flush task on the current tokio runtime.
    ///
    /// The first flush happens one `interval` after start.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime or if `interval` is zero.
    pub fn start(flusher: Arc<Flusher>, interval: Duration) -> Self {
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        info!("Starting flush scheduler with interval {:?}", interval);
        let join_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Flush scheduler received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        run_tick(&flusher, interval).await;
                    }
                }
            }
            info!("Flush scheduler stopped");
        });

        Self {
            join_handle,
            _cancel_on_drop: cancellation_token.clone().drop_guard(),
            cancellation_token,
        }
    }

    /// Stops issuing ticks. A flush already running is allowed to finish.
    pub fn shutdown(&self) { self.cancellation_token.cancel(); }

    /// Waits for the flush task to exit. Call [`shutdown`](Self::shutdown)
    /// first, otherwise this waits forever.
    pub async fn wait_for_stop(self) {
        let Self {
            join_handle,
            _cancel_on_drop,
            ..
        } = self;
        if let Err(e) = join_handle.await {
            warn!("Flush task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool { self.join_handle.is_finished() }
}

async fn run_tick(flusher: &Flusher, interval: Duration) {
    let started = Instant::now();
    let Some(stats) = flusher.try_flush().await else {
        warn!("Previous flush still in progress, skipping this tick");
        return;
    };

    let elapsed = started.elapsed();
    if stats.lines > 0 {
        debug!(
            "Flushed {} lines across {} keys in {:?}",
            stats.lines, stats.keys, elapsed
        );
    }
    if elapsed > interval {
        warn!(
            "Flush took {:?}, longer than the {:?} interval; missed ticks are skipped",
            elapsed, interval
        );
    }
}
