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

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use lineflux_client::{
    Client, ClientOptions, DispatchMode, Fields, Integer, MemorySink, Tags, Timestamp,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_lose_nothing() {
    const WRITERS: i64 = 16;
    const PER_WRITER: i64 = 200;

    let sink = Arc::new(MemorySink::new());
    let options = ClientOptions::builder()
        .mode(DispatchMode::Aggregate)
        .flush_interval(Duration::from_millis(5))
        .build();
    let client = Arc::new(Client::new(options, sink.clone()).unwrap());

    let writers = (0..WRITERS).map(|writer| {
        let client = client.clone();
        tokio::spawn(async move {
            let tags = Tags::from([("host".to_string(), "a".to_string())]);
            for seq in 0..PER_WRITER {
                let fields = Fields::new()
                    .with("writer", Integer::new(writer))
                    .with("seq", Integer::new(seq));
                client
                    .write("m", fields, tags.clone(), Timestamp::Absent)
                    .await
                    .unwrap();
                if seq % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        })
    });
    for result in join_all(writers).await {
        result.unwrap();
    }
    client.close().await;

    let lines = sink.lines();
    assert_eq!(lines.len() as i64, WRITERS * PER_WRITER);

    // Per writer, sequence numbers arrive in order even across flushes.
    for writer in 0..WRITERS {
        let prefix = format!("m,host=a writer={writer}i,seq=");
        let seqs: Vec<i64> = lines
            .iter()
            .filter_map(|line| line.strip_prefix(&prefix))
            .map(|rest| rest.trim_end_matches('i').parse().unwrap())
            .collect();
        assert_eq!(seqs, (0..PER_WRITER).collect::<Vec<_>>());
    }
}
