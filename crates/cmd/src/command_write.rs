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

use std::{error::Error, path::PathBuf, time::Duration};

use clap::Args;
use lineflux_client::{
    Client, ClientOptions, DispatchMode, Fields, Integer, SinkConfig, Tags, Timestamp,
};
use snafu::{OptionExt, ResultExt, Whatever, whatever};
use tracing::info;

use crate::config::{self, FileConfig};

#[derive(Debug, Clone, Args)]
#[command(
    name = "write",
    about = "Encode one point and send it",
    long_about = "Encode one point in line protocol and send it to the configured sink.
Without a sink flag or config file the line is printed to stdout.

Examples:
  lineflux write cpu --value 0.5 --tag host=web-1
  lineflux write cpu --fields '{\"load\":0.5,\"up\":true}' --int-field procs=12
  lineflux write cpu --value 1 --http-url http://localhost:8086 --database metrics
  lineflux write cpu --value 1 --udp-server 127.0.0.1 --udp-port 8089 --no-timestamp"
)]
pub(crate) struct WriteArgs {
    /// Measurement name; the configured prefix is prepended
    measurement: String,

    /// Single number, written as the field `value`
    #[arg(long, allow_hyphen_values = true)]
    value: Option<f64>,

    /// Fields as a JSON object; numbers are sent as floats
    #[arg(long)]
    fields: Option<String>,

    /// Integer field as name=value, may be repeated
    #[arg(long = "int-field", value_parser = parse_int_field)]
    int_fields: Vec<(String, i64)>,

    /// Tag as key=value, may be repeated
    #[arg(short, long = "tag", value_parser = parse_key_value)]
    tags: Vec<(String, String)>,

    /// Timestamp in nanoseconds since the Unix epoch (default: now)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "no_timestamp")]
    timestamp: Option<i64>,

    /// Send the line without a timestamp
    #[arg(long)]
    no_timestamp: bool,

    /// Prefix prepended to the measurement name
    #[arg(long)]
    prefix: Option<String>,

    /// Tag added to every point as key=value, may be repeated
    #[arg(long = "default-tag", value_parser = parse_key_value)]
    default_tags: Vec<(String, String)>,

    /// Dispatch mode: direct or aggregate
    #[arg(long)]
    mode: Option<DispatchMode>,

    /// Flush interval in milliseconds (aggregate mode)
    #[arg(long)]
    flush_interval_ms: Option<u64>,

    /// Base URL of the HTTP write endpoint
    #[arg(long, requires = "database", conflicts_with = "udp_server")]
    http_url: Option<String>,

    /// Database to write to over HTTP
    #[arg(long)]
    database: Option<String>,

    /// UDP server host
    #[arg(long, requires = "udp_port")]
    udp_server: Option<String>,

    /// UDP server port
    #[arg(long, requires = "udp_server")]
    udp_port: Option<u16>,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

impl WriteArgs {
    fn client_options(&self, mut options: ClientOptions) -> ClientOptions {
        if let Some(prefix) = &self.prefix {
            options.prefix = prefix.clone();
        }
        options.default_tags.extend(self.default_tags.iter().cloned());
        if let Some(mode) = self.mode {
            options.mode = mode;
        }
        if let Some(ms) = self.flush_interval_ms {
            options.flush_interval = Duration::from_millis(ms);
        }
        options
    }

    fn sink_config(&self, from_file: SinkConfig) -> Result<SinkConfig, Whatever> {
        if let Some(url) = &self.http_url {
            let database = self
                .database
                .clone()
                .whatever_context("--database is required with --http-url")?;
            return Ok(SinkConfig::Http {
                url: url.clone(),
                database,
            });
        }
        if let (Some(server), Some(port)) = (&self.udp_server, self.udp_port) {
            return Ok(SinkConfig::Udp {
                server: server.clone(),
                port,
            });
        }
        Ok(from_file)
    }

    fn fields(&self) -> Result<Fields, Whatever> {
        let mut fields = match &self.fields {
            Some(raw) => {
                let value: serde_json::Value =
                    serde_json::from_str(raw).whatever_context("--fields is not valid JSON")?;
                let Some(object) = value.as_object() else {
                    whatever!("--fields must be a JSON object");
                };
                Fields::from_json(object).whatever_context("Unsupported field value")?
            }
            None => Fields::new(),
        };
        if let Some(value) = self.value {
            fields.insert("value", value);
        }
        for (name, value) in &self.int_fields {
            fields.insert(name.as_str(), Integer::new(*value));
        }
        Ok(fields)
    }

    fn tags(&self) -> Tags { self.tags.iter().cloned().collect() }

    fn timestamp(&self) -> Timestamp {
        match (self.timestamp, self.no_timestamp) {
            (Some(ns), _) => Timestamp::Nanos(ns),
            (None, true) => Timestamp::Absent,
            (None, false) => Timestamp::Now,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), Box<dyn Error + Send + Sync + 'static>> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_int_field(s: &str) -> Result<(String, i64), Box<dyn Error + Send + Sync + 'static>> {
    let (key, value) = parse_key_value(s)?;
    Ok((key, value.parse()?))
}

/// Run the write command
pub(crate) async fn run(args: WriteArgs) -> Result<(), Whatever> {
    let file = match &args.config {
        Some(path) => config::load(path)?,
        None => FileConfig::default(),
    };

    let options = args.client_options(file.client);
    let sink_config = args.sink_config(file.sink)?;
    let fields = args.fields()?;

    info!("Writing to {:?} in {} mode", sink_config, options.mode);
    let sink = sink_config
        .connect()
        .await
        .whatever_context("Failed to create sink")?;
    let client = Client::new(options, sink).whatever_context("Failed to create client")?;

    let result = client
        .write(&args.measurement, fields, args.tags(), args.timestamp())
        .await
        .whatever_context("Failed to write point");

    // Flush whatever was recorded even if the write failed.
    let stats = client.close().await;
    info!("Done, {} lines flushed on close", stats.lines);
    result
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use lineflux_client::FieldValue;
    use test_case::test_case;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        args: WriteArgs,
    }

    fn parse(argv: &[&str]) -> WriteArgs {
        let argv = std::iter::once("write").chain(argv.iter().copied());
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test_case("host=web-1", ("host", "web-1"))]
    #[test_case("a=b=c", ("a", "b=c"); "splits on first equals")]
    #[test_case("empty=", ("empty", ""))]
    fn test_parse_key_value(input: &str, expected: (&str, &str)) {
        let (k, v) = parse_key_value(input).unwrap();
        assert_eq!((k.as_str(), v.as_str()), expected);
    }

    #[test_case("novalue")]
    #[test_case("n=1.5"; "not an integer")]
    fn test_parse_int_field_errors(input: &str) {
        assert!(parse_int_field(input).is_err());
    }

    #[test]
    fn test_fields_from_flags_keep_order() {
        let args = parse(&[
            "cpu",
            "--fields",
            r#"{"load": 0.5, "up": true, "name": "a b"}"#,
            "--int-field",
            "procs=12",
            "--value",
            "-1",
        ]);
        let fields = args.fields().unwrap();
        let names: Vec<_> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["load", "up", "name", "value", "procs"]);
        assert_eq!(fields.get("value"), Some(&FieldValue::Float(-1.0)));
        assert_eq!(fields.get("procs"), Some(&FieldValue::Integer(Integer::new(12))));
    }

    #[test]
    fn test_fields_must_be_an_object() {
        let args = parse(&["cpu", "--fields", "[1, 2]"]);
        assert!(args.fields().is_err());

        let args = parse(&["cpu", "--fields", r#"{"nested": {"a": 1}}"#]);
        assert!(args.fields().is_err());
    }

    #[test]
    fn test_timestamp_flags() {
        assert_eq!(parse(&["m"]).timestamp(), Timestamp::Now);
        assert_eq!(parse(&["m", "--no-timestamp"]).timestamp(), Timestamp::Absent);
        assert_eq!(
            parse(&["m", "--timestamp", "42"]).timestamp(),
            Timestamp::Nanos(42)
        );
        assert!(TestCli::try_parse_from(["write", "m", "--timestamp", "1", "--no-timestamp"]).is_err());
    }

    #[test]
    fn test_flags_override_file_options() {
        let args = parse(&[
            "m",
            "--prefix",
            "cli.",
            "--default-tag",
            "dc=eu",
            "--mode",
            "aggregate",
            "--flush-interval-ms",
            "250",
        ]);
        let from_file = ClientOptions::builder()
            .prefix("file.")
            .default_tags(Tags::from([("machine".to_string(), "gauss".to_string())]))
            .build();

        let options = args.client_options(from_file);
        assert_eq!(options.prefix, "cli.");
        assert_eq!(options.default_tags.len(), 2);
        assert_eq!(options.mode, DispatchMode::Aggregate);
        assert_eq!(options.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_sink_selection() {
        let http = parse(&["m", "--http-url", "http://db:8086", "--database", "metrics"]);
        assert_eq!(http.sink_config(SinkConfig::Stdout).unwrap(), SinkConfig::Http {
            url:      "http://db:8086".to_string(),
            database: "metrics".to_string(),
        });

        let udp = parse(&["m", "--udp-server", "127.0.0.1", "--udp-port", "8089"]);
        assert_eq!(udp.sink_config(SinkConfig::Stdout).unwrap(), SinkConfig::Udp {
            server: "127.0.0.1".to_string(),
            port:   8089,
        });

        let none = parse(&["m"]);
        assert_eq!(none.sink_config(SinkConfig::Stdout).unwrap(), SinkConfig::Stdout);

        assert!(TestCli::try_parse_from(["write", "m", "--http-url", "http://db:8086"]).is_err());
    }

    #[test]
    fn test_tags() {
        let args = parse(&["m", "-t", "z=1", "--tag", "a=2"]);
        let tags = args.tags();
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["a", "z"]);
    }
}
