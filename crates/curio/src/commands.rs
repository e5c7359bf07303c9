use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::config::Config;
use crate::dataset;
use crate::index::{self, Course};
use crate::poster::{self, HttpPosterResolver, PosterResolver, StaticPosterResolver};
use crate::recommender::Recommender;

/// Index build options
#[derive(Args, Debug, Default)]
pub struct BuildOptions {
  /// Dataset snapshot to index (JSON or YAML list of courses)
  #[arg(short, long, conflicts_with = "sample", required_unless_present = "sample")]
  pub dataset: Option<PathBuf>,
  /// Index the built-in sample catalogue instead of a dataset file
  #[arg(long)]
  pub sample: bool,
  /// Output directory (defaults to the configured index directory)
  #[arg(short, long)]
  pub out: Option<PathBuf>,
  /// Maximum vocabulary size
  #[arg(short, long)]
  pub max_features: Option<usize>,
  /// Overwrite existing artifacts without keeping a backup
  #[arg(long)]
  pub no_backup: bool,
}

/// Build the course table and similarity matrix and write them to disk
pub fn build_index(config: &Config, options: &BuildOptions) -> Result<()> {
  let records = match &options.dataset {
    Some(path) if !options.sample => dataset::load(path)
      .with_context(|| format!("Failed to read dataset {}", path.display()))?,
    _ => dataset::sample(),
  };

  let max_features = options.max_features.unwrap_or(config.max_features);
  let (table, matrix) = index::build(&records, max_features)?;

  let out = options.out.clone().unwrap_or_else(|| config.index_dir.clone());
  let backup = index::save(&out, &table, &matrix, !options.no_backup)
    .with_context(|| format!("Failed to write index to {}", out.display()))?;

  if let Some(backup) = backup {
    println!("{} Previous index moved to {}", "↺".yellow(), backup.display().to_string().cyan());
  }
  println!(
    "{} Indexed {} courses into {}",
    "✓".green(),
    table.len().to_string().yellow(),
    out.display().to_string().cyan()
  );
  Ok(())
}

fn load_recommender(config: &Config) -> Result<Recommender> {
  Recommender::load(&config.index_dir)
    .with_context(|| format!("Failed to load index from {}", config.index_dir.display()))
}

/// Pick the poster resolver the configuration asks for
pub fn poster_resolver(config: &Config) -> Result<Box<dyn PosterResolver>> {
  if config.verify_posters {
    Ok(Box::new(HttpPosterResolver::new(config.poster_placeholder.clone())?))
  } else {
    Ok(Box::new(StaticPosterResolver::new(config.poster_placeholder.clone())))
  }
}

/// Print the courses most similar to `title`
pub async fn recommend(config: &Config, title: &str, k: Option<usize>, show_scores: bool) -> Result<()> {
  let recommender = load_recommender(config)?;
  let k = k.unwrap_or(config.top_k);

  let query = recommender.course(title)?;
  let ranked = recommender.recommend_scored(title, k)?;

  if ranked.is_empty() {
    if recommender.len() <= 1 {
      println!("No other courses to recommend for {}", query.title.yellow());
    } else {
      println!("No recommendations requested for {}", query.title.yellow());
    }
    return Ok(());
  }

  let courses: Vec<&Course> = ranked.iter().filter_map(|r| recommender.course_by_id(r.id)).collect();
  let resolver = poster_resolver(config)?;
  let posters =
    poster::resolve_all(resolver.as_ref(), &courses, &config.poster_placeholder, poster::BATCH_DEADLINE).await;

  println!("=== Courses like {} ===", query.title.blue().bold());
  for (rank, ((recommendation, course), poster)) in ranked.iter().zip(&courses).zip(&posters).enumerate() {
    if show_scores {
      println!(
        "{:>2}. {} {}",
        rank + 1,
        course.title.yellow().bold(),
        format!("({:.3})", recommendation.score).dimmed()
      );
    } else {
      println!("{:>2}. {}", rank + 1, course.title.yellow().bold());
    }
    if !course.url.is_empty() {
      println!("    course: {}", course.url.cyan());
    }
    println!("    poster: {}", poster.dimmed());
  }

  Ok(())
}

/// Print every course in the index
pub fn list_courses(config: &Config, verbose: bool) -> Result<()> {
  let recommender = load_recommender(config)?;

  for course in recommender.courses() {
    println!("{:>4}  {}", course.id.to_string().dimmed(), course.title.yellow());
    if verbose && !course.description.is_empty() {
      println!("      {}", course.description);
    }
  }

  Ok(())
}

/// Print the details of a single course
pub fn show_course(config: &Config, title: &str) -> Result<()> {
  let recommender = load_recommender(config)?;
  let course = recommender.course(title)?;

  println!("=== {} ===", course.title.blue().bold());
  if course.description.is_empty() {
    println!("{}", "No description available".dimmed());
  } else {
    println!("{}", course.description);
  }
  if !course.url.is_empty() {
    println!("course: {}", course.url.cyan());
  }
  if !course.poster.is_empty() {
    println!("poster: {}", course.poster.cyan());
  }

  Ok(())
}

/// Load the index and report whether it is consistent
pub fn check_index(config: &Config) -> Result<()> {
  let recommender = load_recommender(config)?;

  println!(
    "{} Index at {} is consistent: {} courses, built {}",
    "✓".green(),
    config.index_dir.display().to_string().cyan(),
    recommender.len().to_string().yellow(),
    recommender.table().built_at().format("%Y-%m-%d %H:%M:%S UTC")
  );
  Ok(())
}
