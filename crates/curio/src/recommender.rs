use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::index::{self, Course, CourseTable, SimilarityMatrix};

/// Number of recommendations returned when the caller does not ask for more
pub const DEFAULT_TOP_K: usize = 5;

/// A ranked neighbour of the queried course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
  pub id: usize,
  pub title: String,
  pub score: f64,
}

/// Read-only recommendation service over a loaded index.
///
/// Construct once at startup and share by reference (or `Arc`) with every
/// request handler. Nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct Recommender {
  table: CourseTable,
  matrix: SimilarityMatrix,
}

impl Recommender {
  pub fn new(table: CourseTable, matrix: SimilarityMatrix) -> Result<Self> {
    index::check_consistency(&table, &matrix)?;
    Ok(Self { table, matrix })
  }

  /// Load and verify the artifacts in `dir`
  pub fn load(dir: &Path) -> Result<Self> {
    let (table, matrix) = index::load(dir)?;
    Self::new(table, matrix)
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  /// All courses in id order
  pub fn courses(&self) -> &[Course] {
    self.table.courses()
  }

  pub fn table(&self) -> &CourseTable {
    &self.table
  }

  pub fn course(&self, title: &str) -> Result<&Course> {
    self.table.find(title).ok_or_else(|| Error::unknown(title))
  }

  pub fn course_by_id(&self, id: usize) -> Option<&Course> {
    self.table.get(id)
  }

  /// Titles of the `k` courses most similar to `title`, best first
  pub fn recommend(&self, title: &str, k: usize) -> Result<Vec<String>> {
    Ok(self.recommend_scored(title, k)?.into_iter().map(|r| r.title).collect())
  }

  /// Ranked neighbours of `title` with their similarity scores.
  ///
  /// The query course is never included. Equal scores are ordered by
  /// ascending id. Asking for more than `n - 1` results returns every other
  /// course.
  pub fn recommend_scored(&self, title: &str, k: usize) -> Result<Vec<Recommendation>> {
    let query = self.course(title)?;
    let row = self.matrix.row(query.id);

    let mut ranked: Vec<(usize, f64)> =
      row.iter().copied().enumerate().filter(|&(id, _)| id != query.id).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(k);

    debug!(title = %query.title, k, returned = ranked.len(), "ranked recommendations");

    Ok(
      ranked
        .into_iter()
        .map(|(id, score)| Recommendation { id, title: self.table.courses()[id].title.clone(), score })
        .collect(),
    )
  }
}
