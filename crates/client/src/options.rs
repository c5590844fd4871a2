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

use std::time::Duration;

use lineflux_protocol::Tags;
use serde::{Deserialize, Deserializer};

/// Default interval between two flushes in aggregation mode
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(10_000);

/// How written points reach the sink
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchMode {
    /// Every write is encoded and sent immediately
    #[default]
    Direct,
    /// Writes are grouped by identity key and flushed periodically
    Aggregate,
}

/// Client configuration. Fixed once the client is created.
///
/// ```rust
/// use std::time::Duration;
///
/// use lineflux_client::{ClientOptions, DispatchMode};
///
/// let options = ClientOptions::builder()
///     .prefix("app.")
///     .mode(DispatchMode::Aggregate)
///     .flush_interval(Duration::from_secs(5))
///     .build();
/// assert_eq!(options.prefix, "app.");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, bon::Builder)]
#[serde(default)]
pub struct ClientOptions {
    /// Prepended verbatim to every measurement name
    #[builder(into, default)]
    pub prefix:         String,
    /// Tags added to every point; tags passed to `write` win on conflict
    #[builder(default)]
    pub default_tags:   Tags,
    /// Only used in aggregation mode
    #[builder(default = DEFAULT_FLUSH_INTERVAL)]
    #[serde(rename = "flush_interval_ms", deserialize_with = "deserialize_millis")]
    pub flush_interval: Duration,
    #[builder(default)]
    pub mode:           DispatchMode,
}

impl Default for ClientOptions {
    fn default() -> Self { Self::builder().build() }
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
