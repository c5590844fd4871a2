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

use clap::{Parser, Subcommand};
use human_panic::setup_panic;
use lineflux_common::{LoggingOptions, init_logging};
use snafu::{ResultExt, Whatever};
use tracing::info;

mod command_write;
mod config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(
    name = "lineflux",
    about = "Line protocol metrics client command line interface",
    version = VERSION,
    propagate_version = true
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode one point and send it to the configured sink
    Write(command_write::WriteArgs),
}

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    setup_panic!();

    // Parse command line arguments
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries protocol lines.
    let logging = LoggingOptions::default().with_level(&cli.log_level);
    init_logging(&logging).whatever_context("Failed to initialize logging")?;

    info!("Starting lineflux version {}", VERSION);

    // Execute the selected command
    match cli.command {
        Commands::Write(args) => {
            command_write::run(args).await?;
        }
    }
    Ok(())
}
