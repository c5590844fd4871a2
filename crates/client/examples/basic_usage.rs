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

//! Basic usage example for the lineflux client library
//!
//! Records a few points in aggregation mode, lets one scheduled flush run
//! and prints everything the sink received.
//!
//! To run this example: `cargo run --example basic_usage`

use std::{sync::Arc, time::Duration};

use lineflux_client::{
    Client, ClientOptions, DispatchMode, Fields, Integer, KeepLatest, MemorySink, Tags, Timestamp,
};
use lineflux_common::{LoggingOptions, init_logging};
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingOptions::default().with_level("info"))?;

    let sink = Arc::new(MemorySink::new());
    let options = ClientOptions::builder()
        .prefix("example.")
        .default_tags(Tags::from([("machine".to_string(), "gauss".to_string())]))
        .mode(DispatchMode::Aggregate)
        .flush_interval(Duration::from_millis(200))
        .build();

    // Only the most recent reading of each series survives a flush.
    let client = Client::with_merge(options, sink.clone(), KeepLatest)?;

    for i in 0..5 {
        let tags = Tags::from([("core".to_string(), (i % 2).to_string())]);
        let fields = Fields::new()
            .with("load", 0.25 * f64::from(i))
            .with("procs", Integer::new(100 + i64::from(i)))
            .with("healthy", true);
        client.write("cpu", fields, tags, Timestamp::Now).await?;
    }
    info!("{} lines pending before the first flush", client.pending_lines());

    sleep(Duration::from_millis(300)).await;
    info!("Scheduled flush delivered {} lines", sink.lines().len());

    client
        .write("requests", 3.0, Tags::new(), Timestamp::Absent)
        .await?;
    let stats = client.close().await;
    info!("Close flushed {} lines from {} series", stats.lines, stats.keys);

    for line in sink.take() {
        println!("{line}");
    }
    Ok(())
}
