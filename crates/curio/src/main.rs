use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use curio::commands::{self, BuildOptions};
use curio::config::Config;

#[derive(Parser)]
#[command(name = "curio")]
#[command(about = "Curio - Course Recommender\nFind courses similar to the ones you already like")]
#[command(version)]
struct Cli {
  /// Configuration file (defaults to ./curio.json when present)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

// violet ignore chunk
#[derive(Subcommand)]
enum Commands {
  /// Build the similarity index from a course dataset
  Build {
    #[command(flatten)]
    options: BuildOptions,
  },
  /// Recommend courses similar to the given one
  Recommend {
    /// Course title (words are joined with spaces)
    #[arg(required = true)]
    title: Vec<String>,
    /// Number of recommendations
    #[arg(short)]
    k: Option<usize>,
    /// Show similarity scores
    #[arg(short, long)]
    scores: bool,
  },
  /// List all indexed courses
  List {
    /// Show descriptions
    #[arg(long)]
    long: bool,
  },
  /// Show a single course
  Show {
    /// Course title (words are joined with spaces)
    #[arg(required = true)]
    title: Vec<String>,
  },
  /// Verify that the index artifacts load and agree with each other
  Check,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose { EnvFilter::new("curio=debug,warn") } else { EnvFilter::new("curio=info,warn") };
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let config = Config::load(cli.config.as_deref())?;

  match cli.command {
    Commands::Build { options } => {
      commands::build_index(&config, &options)?;
    }
    Commands::Recommend { title, k, scores } => {
      commands::recommend(&config, &title.join(" "), k, scores).await?;
    }
    Commands::List { long } => {
      commands::list_courses(&config, long)?;
    }
    Commands::Show { title } => {
      commands::show_course(&config, &title.join(" "))?;
    }
    Commands::Check => {
      commands::check_index(&config)?;
    }
  }

  Ok(())
}
