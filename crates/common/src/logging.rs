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

use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LoggingError {
    #[snafu(display("Invalid log filter '{filter}': {source}"))]
    InvalidFilter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[snafu(display("Failed to install global tracing subscriber: {source}"))]
    SetGlobalDefault {
        source: tracing::subscriber::SetGlobalDefaultError,
    },
}

/// Logging configuration shared by every lineflux binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `lineflux_client=debug`.
    pub level:       String,
    /// Display the thread ID an event was recorded on
    pub thread_ids:  bool,
    /// Display source code file paths and line numbers
    pub source_info: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level:       "info".to_string(),
            thread_ids:  true,
            source_info: true,
        }
    }
}

impl LoggingOptions {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Resolves the effective filter. `RUST_LOG` wins over the configured
    /// level.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).context(InvalidFilterSnafu {
            filter: self.level.clone(),
        })
    }
}

/// Installs a compact `fmt` subscriber as the global default.
///
/// Events are written to stderr so stdout stays free for program output.
pub fn init_logging(options: &LoggingOptions) -> Result<(), LoggingError> {
    let filter = options.env_filter()?;

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(options.source_info)
        .with_line_number(options.source_info)
        .with_thread_ids(options.thread_ids)
        // Don't display the event's target (module path)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context(SetGlobalDefaultSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert!(options.thread_ids);
        assert!(options.source_info);
    }

    #[test]
    fn test_with_level() {
        let options = LoggingOptions::default().with_level("debug");
        assert_eq!(options.level, "debug");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        // SAFETY: no other test in this crate reads or writes RUST_LOG.
        unsafe { std::env::remove_var("RUST_LOG") };
        let options = LoggingOptions::default().with_level("lineflux=notalevel");
        let err = options.env_filter().unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
    }
}
