//! Curio REST Server
//!
//! HTTP API serving course recommendations from a prebuilt index.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use curio::config::Config;
use curio::server::startup::start_server;

#[derive(Parser)]
#[command(name = "curio_server")]
#[command(about = "Curio REST API Server")]
#[command(version)]
struct Args {
  /// Configuration file (defaults to ./curio.json when present)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Server bind address (overrides the configuration)
  #[arg(long)]
  bind: Option<SocketAddr>,

  /// Index directory (overrides the configuration)
  #[arg(long)]
  index: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("curio=debug,tower_http=debug,info")
  } else {
    EnvFilter::new("curio=info,warn")
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(bind) = args.bind {
    config.bind = bind;
  }
  if let Some(index) = args.index {
    config.index_dir = index;
  }

  info!("Starting Curio REST Server v{}", env!("CARGO_PKG_VERSION"));
  start_server(&config).await
}
