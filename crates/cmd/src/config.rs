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

use std::{fs, path::Path};

use lineflux_client::{ClientOptions, SinkConfig};
use serde::Deserialize;
use snafu::{ResultExt, Whatever};

/// Contents of a `--config` file.
///
/// ```json
/// {
///   "client": { "prefix": "app.", "default_tags": { "machine": "gauss" } },
///   "sink": { "type": "http", "url": "http://localhost:8086", "database": "metrics" }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub client: ClientOptions,
    pub sink:   SinkConfig,
}

pub(crate) fn load(path: &Path) -> Result<FileConfig, Whatever> {
    let raw = fs::read_to_string(path)
        .with_whatever_context(|_| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_whatever_context(|_| format!("Failed to parse config file {}", path.display()))
}
