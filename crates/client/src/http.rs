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

use async_trait::async_trait;
use reqwest::Client;
use snafu::ResultExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    sink::Sink,
    types::{ClientResult, HttpSnafu, InvalidUrlSnafu},
};

/// HTTP transport: every line is sent as the body of a POST to
/// `<base_url>/write?db=<database>`.
///
/// Failures (connection errors and non-2xx responses) are logged and the
/// line is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use lineflux_client::{HttpSink, Sink};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = HttpSink::new("http://localhost:8086", "metrics")?;
///     sink.send("cpu,host=a load=0.5").await;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpSink {
    /// The HTTP client
    client:    Client,
    /// Fully built write endpoint, including the database query parameter
    write_url: Url,
}

impl HttpSink {
    /// Creates a new HTTP sink for the specified server and database
    ///
    /// # Errors
    /// Returns a `ClientError` if the base URL is invalid
    pub fn new<S: AsRef<str>>(base_url: S, database: &str) -> ClientResult<Self> {
        info!(
            "Creating HTTP sink for {} (database {})",
            base_url.as_ref(),
            database
        );

        // Create HTTP client with no proxy to avoid proxy issues with localhost
        let client = Client::builder().no_proxy().build().context(HttpSnafu)?;

        let mut base = Url::parse(base_url.as_ref()).context(InvalidUrlSnafu)?;
        // Keep any path prefix the server is mounted under.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut write_url = base.join("write").context(InvalidUrlSnafu)?;
        write_url.query_pairs_mut().append_pair("db", database);

        Ok(Self { client, write_url })
    }

    pub fn write_url(&self) -> &Url { &self.write_url }
}

#[async_trait]
impl Sink for HttpSink {
    async fn send(&self, line: &str) {
        debug!("Sending POST request to: {}", self.write_url);

        let response = match self
            .client
            .post(self.write_url.clone())
            .body(line.to_string())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to send line to {}: {}", self.write_url, e);
                return;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Line accepted with status {}", status);
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Server rejected line with status {}: {}", status, body);
        }
    }
}
