use thiserror::Error;

/// Errors raised while building, loading or querying a course index
#[derive(Debug, Error)]
pub enum Error {
  #[error("Dataset contains no usable course records")]
  EmptyDataset,

  #[error("Unknown course: '{title}'")]
  UnknownCourse { title: String },

  #[error("Corrupt course index: {reason}")]
  CorruptIndex { reason: String },

  #[error("Duplicate course title: '{title}'")]
  DuplicateCourse { title: String },

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),
}

impl Error {
  pub fn corrupt(reason: impl Into<String>) -> Self {
    Error::CorruptIndex { reason: reason.into() }
  }

  pub fn unknown(title: impl Into<String>) -> Self {
    Error::UnknownCourse { title: title.into() }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
