// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use sitemirror_cli::commands::{self, run::WatchOptions, BuildOptions};
use sitemirror_cli::config::WatchBackend;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitemirror")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Render a source tree into a mirrored output tree and keep it up to date", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Quiet mode: only show errors (useful for CI)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, then watch the source directory and rebuild on change
    Run {
        #[command(flatten)]
        build: BuildOptions,
        /// Watch backend (overrides sitemirror.toml)
        #[arg(long, value_enum)]
        backend: Option<WatchBackend>,
        /// Quiet period before a change starts a rebuild, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Build once and exit
    Build {
        #[command(flatten)]
        build: BuildOptions,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Run {
            build,
            backend,
            debounce_ms,
        } => {
            let watch = WatchOptions {
                backend,
                debounce_ms,
            };
            commands::run::run(&build, &watch, cli.quiet).await
        }
        Commands::Build { build } => commands::build::run(&build, cli.quiet).await,
    }
}
