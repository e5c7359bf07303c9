//! Configuration management for curio
//!
//! Settings come from built-in defaults, then an optional JSON file, then
//! `CURIO_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::poster::DEFAULT_PLACEHOLDER;
use crate::recommender::DEFAULT_TOP_K;
use crate::tfidf::DEFAULT_MAX_FEATURES;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "curio.json";

pub const INDEX_DIR_ENV: &str = "CURIO_INDEX_DIR";
pub const TOP_K_ENV: &str = "CURIO_TOP_K";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Directory holding the course table and similarity matrix
  #[serde(default = "default_index_dir")]
  pub index_dir: PathBuf,
  /// Recommendations returned per request
  #[serde(default = "default_top_k")]
  pub top_k: usize,
  /// Vocabulary cap used when building the index
  #[serde(default = "default_max_features")]
  pub max_features: usize,
  /// Image shown when a course has no usable poster
  #[serde(default = "default_poster_placeholder")]
  pub poster_placeholder: String,
  /// Check poster URLs over HTTP before returning them
  #[serde(default)]
  pub verify_posters: bool,
  /// REST server bind address
  #[serde(default = "default_bind")]
  pub bind: SocketAddr,
}

fn default_index_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".curio").join("index")
}
fn default_top_k() -> usize {
  DEFAULT_TOP_K
}
fn default_max_features() -> usize {
  DEFAULT_MAX_FEATURES
}
fn default_poster_placeholder() -> String {
  DEFAULT_PLACEHOLDER.to_string()
}
fn default_bind() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 3000))
}

impl Default for Config {
  fn default() -> Self {
    Self {
      index_dir: default_index_dir(),
      top_k: default_top_k(),
      max_features: default_max_features(),
      poster_placeholder: default_poster_placeholder(),
      verify_posters: false,
      bind: default_bind(),
    }
  }
}

impl Config {
  /// Load from an explicit file, or from `curio.json` if it exists, then apply the environment
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let config = match path {
      Some(path) => Self::load_from_file(path)?,
      None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
        Self::load_from_file(Path::new(DEFAULT_CONFIG_FILE))?
      }
      None => Self::default(),
    };

    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
  }

  pub fn load_from_file(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
  }

  fn with_env_overrides(mut self) -> Result<Self> {
    if let Ok(dir) = std::env::var(INDEX_DIR_ENV) {
      self.index_dir = PathBuf::from(dir);
    }

    if let Ok(top_k) = std::env::var(TOP_K_ENV) {
      self.top_k = top_k
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{TOP_K_ENV} must be a positive integer, got '{top_k}'")))?;
    }

    Ok(self)
  }

  pub fn validate(&self) -> Result<()> {
    if self.top_k == 0 {
      return Err(Error::Config("top_k must be at least 1".to_string()));
    }
    if self.max_features == 0 {
      return Err(Error::Config("max_features must be at least 1".to_string()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn clear_env() {
    std::env::remove_var(INDEX_DIR_ENV);
    std::env::remove_var(TOP_K_ENV);
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.top_k, 5);
    assert_eq!(config.max_features, 5000);
    assert!(!config.verify_posters);
    assert!(config.index_dir.ends_with(".curio/index"));
    assert_eq!(config.bind.port(), 3000);
  }

  #[test]
  #[serial]
  fn test_partial_file_keeps_defaults() -> Result<()> {
    clear_env();
    let temp = TempDir::new()?;
    let path = temp.path().join("curio.json");
    fs::write(&path, r#"{"top_k": 8, "verify_posters": true}"#)?;

    let config = Config::load(Some(path.as_path()))?;
    assert_eq!(config.top_k, 8);
    assert!(config.verify_posters);
    assert_eq!(config.max_features, 5000);
    Ok(())
  }

  #[test]
  #[serial]
  fn test_env_overrides_file() -> Result<()> {
    clear_env();
    let temp = TempDir::new()?;
    let path = temp.path().join("curio.json");
    fs::write(&path, r#"{"top_k": 8, "index_dir": "/from/file"}"#)?;

    std::env::set_var(INDEX_DIR_ENV, temp.path());
    std::env::set_var(TOP_K_ENV, "3");
    let config = Config::load(Some(path.as_path()));
    clear_env();

    let config = config?;
    assert_eq!(config.index_dir, temp.path());
    assert_eq!(config.top_k, 3);
    Ok(())
  }

  #[test]
  #[serial]
  fn test_invalid_env_top_k() {
    clear_env();
    std::env::set_var(TOP_K_ENV, "many");
    let result = Config::load(Some(Path::new("/nonexistent/curio.json")));
    clear_env();

    // The missing explicit file is reported before the environment is read
    assert!(matches!(result, Err(Error::Config(_))));

    std::env::set_var(TOP_K_ENV, "many");
    let result = Config::default().with_env_overrides();
    clear_env();
    assert!(matches!(result, Err(Error::Config(message)) if message.contains("many")));
  }

  #[test]
  #[serial]
  fn test_zero_top_k_rejected() -> Result<()> {
    clear_env();
    let temp = TempDir::new()?;
    let path = temp.path().join("curio.json");
    fs::write(&path, r#"{"top_k": 0}"#)?;

    assert!(matches!(Config::load(Some(path.as_path())), Err(Error::Config(_))));
    Ok(())
  }

  #[test]
  fn test_malformed_file() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("curio.json");
    fs::write(&path, "{ not json")?;

    assert!(matches!(Config::load_from_file(&path), Err(Error::Config(_))));
    Ok(())
  }
}
