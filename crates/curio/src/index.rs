//! Offline index builder and artifact persistence
//!
//! An index is a directory holding a course table and the dense pairwise
//! similarity matrix derived from it. Both files carry a schema identifier
//! and are checked against each other when loaded, so a stale or mismatched
//! pair is rejected instead of silently served.

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::dataset::RawCourse;
use crate::error::{Error, Result};
use crate::text;
use crate::tfidf::{self, SparseVector};

pub const COURSE_TABLE_SCHEMA: &str = "curio.course-table/v1";
pub const SIMILARITY_SCHEMA: &str = "curio.similarity/v1";

/// Backup directories kept next to the live artifacts
pub const MAX_BACKUPS: usize = 5;

pub const COURSES_FILE: &str = "courses.json";
pub const SIMILARITY_FILE: &str = "similarity.json";

/// A course as persisted in the course table. `id` is its matrix row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub id: usize,
  pub title: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub poster: String,
  #[serde(default)]
  pub description: String,
}

/// Ordered course list with a lookup from normalized title to id
#[derive(Debug, Clone)]
pub struct CourseTable {
  courses: Vec<Course>,
  by_title: HashMap<String, usize>,
  built_at: DateTime<Utc>,
}

impl CourseTable {
  /// Validate ids and title uniqueness, then index titles
  pub fn new(courses: Vec<Course>, built_at: DateTime<Utc>) -> Result<Self> {
    let mut by_title = HashMap::with_capacity(courses.len());

    for (position, course) in courses.iter().enumerate() {
      if course.id != position {
        return Err(Error::corrupt(format!(
          "course '{}' has id {} but sits at row {}",
          course.title, course.id, position
        )));
      }

      let key = text::normalize_title(&course.title);
      if key.is_empty() {
        return Err(Error::corrupt(format!("course at row {position} has a blank title")));
      }
      if by_title.insert(key, position).is_some() {
        return Err(Error::corrupt(format!("duplicate course title '{}'", course.title)));
      }
    }

    Ok(Self { courses, by_title, built_at })
  }

  pub fn len(&self) -> usize {
    self.courses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.courses.is_empty()
  }

  pub fn courses(&self) -> &[Course] {
    &self.courses
  }

  pub fn get(&self, id: usize) -> Option<&Course> {
    self.courses.get(id)
  }

  pub fn built_at(&self) -> DateTime<Utc> {
    self.built_at
  }

  /// Resolve a title using the same normalization applied at build time
  pub fn find(&self, title: &str) -> Option<&Course> {
    self.by_title.get(&text::normalize_title(title)).map(|&id| &self.courses[id])
  }
}

/// Square, symmetric matrix of cosine similarities with a unit diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
  scores: Array2<f64>,
}

impl SimilarityMatrix {
  /// Pairwise cosine similarity of unit-length vectors.
  ///
  /// Only the upper triangle is computed and mirrored. The diagonal is 1.0
  /// even for courses whose vector is zero.
  pub fn from_vectors(vectors: &[SparseVector]) -> Self {
    let n = vectors.len();
    let mut scores = Array2::<f64>::zeros((n, n));

    for i in 0..n {
      scores[[i, i]] = 1.0;
      for j in (i + 1)..n {
        let score = vectors[i].dot(&vectors[j]).clamp(0.0, 1.0);
        scores[[i, j]] = score;
        scores[[j, i]] = score;
      }
    }

    Self { scores }
  }

  /// Rebuild a matrix from persisted rows, checking every invariant once
  pub fn from_rows(size: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
    if rows.len() != size {
      return Err(Error::corrupt(format!("similarity matrix declares size {size} but has {} rows", rows.len())));
    }

    let mut flat = Vec::with_capacity(size * size);
    for (i, row) in rows.into_iter().enumerate() {
      if row.len() != size {
        return Err(Error::corrupt(format!("similarity row {i} has {} columns, expected {size}", row.len())));
      }
      flat.extend(row);
    }

    let scores = Array2::from_shape_vec((size, size), flat)
      .map_err(|e| Error::corrupt(format!("similarity matrix has an invalid shape: {e}")))?;

    for ((i, j), &score) in scores.indexed_iter() {
      if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(Error::corrupt(format!("similarity ({i}, {j}) = {score} is outside [0, 1]")));
      }
      if i == j && score != 1.0 {
        return Err(Error::corrupt(format!("diagonal entry {i} is {score}, expected 1.0")));
      }
      if j > i && score != scores[[j, i]] {
        return Err(Error::corrupt(format!("similarity matrix is not symmetric at ({i}, {j})")));
      }
    }

    Ok(Self { scores })
  }

  pub fn size(&self) -> usize {
    self.scores.nrows()
  }

  pub fn get(&self, i: usize, j: usize) -> f64 {
    self.scores[[i, j]]
  }

  pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
    self.scores.row(i)
  }

  pub fn to_rows(&self) -> Vec<Vec<f64>> {
    self.scores.rows().into_iter().map(|row| row.to_vec()).collect()
  }
}

/// Fail unless the matrix has exactly one row per course
pub fn check_consistency(table: &CourseTable, matrix: &SimilarityMatrix) -> Result<()> {
  if matrix.size() != table.len() {
    return Err(Error::corrupt(format!(
      "similarity matrix is {0}x{0} but the course table has {1} courses; rebuild both together",
      matrix.size(),
      table.len()
    )));
  }
  Ok(())
}

/// Build the course table and similarity matrix from a raw dataset snapshot
pub fn build(records: &[RawCourse], max_features: usize) -> Result<(CourseTable, SimilarityMatrix)> {
  if max_features == 0 {
    return Err(Error::Config("max_features must be at least 1".to_string()));
  }

  let usable: Vec<&RawCourse> = records
    .iter()
    .filter(|record| {
      let blank = text::normalize_title(&record.title).is_empty();
      if blank {
        warn!(description = %record.description, "skipping course record with a blank title");
      }
      !blank
    })
    .collect();

  if usable.is_empty() {
    return Err(Error::EmptyDataset);
  }

  let mut seen = HashSet::with_capacity(usable.len());
  for record in &usable {
    if !seen.insert(text::normalize_title(&record.title)) {
      return Err(Error::DuplicateCourse { title: record.title.trim().to_string() });
    }
  }

  let courses = usable
    .iter()
    .enumerate()
    .map(|(id, record)| Course {
      id,
      title: record.title.trim().to_string(),
      url: record.url.clone(),
      poster: record.poster.clone(),
      description: record.description.clone(),
    })
    .collect();
  let table = CourseTable::new(courses, Utc::now())?;

  let documents: Vec<Vec<String>> =
    usable.iter().map(|record| text::tokenize(&record.feature_text())).collect();
  let model = tfidf::fit_transform(&documents, max_features);

  let empty = model.vectors.iter().filter(|v| v.is_zero()).count();
  if empty > 0 {
    warn!(courses = empty, "courses with no usable feature terms will only match themselves");
  }

  let matrix = SimilarityMatrix::from_vectors(&model.vectors);
  info!(courses = table.len(), vocabulary = model.vocabulary.len(), "built similarity index");

  Ok((table, matrix))
}

#[derive(Serialize, Deserialize)]
struct CourseTableFile {
  schema: String,
  built_at: DateTime<Utc>,
  courses: Vec<Course>,
}

#[derive(Serialize, Deserialize)]
struct SimilarityFile {
  schema: String,
  size: usize,
  rows: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct SchemaProbe {
  schema: Option<String>,
}

/// Write both artifacts into `dir`.
///
/// An existing pair is moved into a `backup-<unix-seconds>` directory first
/// when `backup` is set, and only the newest [`MAX_BACKUPS`] backups are kept.
/// Returns the backup directory if one was created.
pub fn save(
  dir: &Path,
  table: &CourseTable,
  matrix: &SimilarityMatrix,
  backup: bool,
) -> Result<Option<PathBuf>> {
  check_consistency(table, matrix)?;
  fs::create_dir_all(dir)?;

  let backup_dir = if backup { backup_existing(dir)? } else { None };

  let courses = CourseTableFile {
    schema: COURSE_TABLE_SCHEMA.to_string(),
    built_at: table.built_at,
    courses: table.courses.clone(),
  };
  let similarity = SimilarityFile {
    schema: SIMILARITY_SCHEMA.to_string(),
    size: matrix.size(),
    rows: matrix.to_rows(),
  };

  write_atomic(&dir.join(COURSES_FILE), &serde_json::to_vec_pretty(&courses)?)?;
  write_atomic(&dir.join(SIMILARITY_FILE), &serde_json::to_vec(&similarity)?)?;

  info!(dir = %dir.display(), courses = table.len(), "saved index artifacts");
  Ok(backup_dir)
}

/// Load both artifacts from `dir` and verify they belong together
pub fn load(dir: &Path) -> Result<(CourseTable, SimilarityMatrix)> {
  let courses: CourseTableFile = read_artifact(&dir.join(COURSES_FILE), COURSE_TABLE_SCHEMA)?;
  let table = CourseTable::new(courses.courses, courses.built_at)?;

  let similarity: SimilarityFile = read_artifact(&dir.join(SIMILARITY_FILE), SIMILARITY_SCHEMA)?;
  let matrix = SimilarityMatrix::from_rows(similarity.size, similarity.rows)?;

  check_consistency(&table, &matrix)?;

  debug!(dir = %dir.display(), courses = table.len(), "loaded index artifacts");
  Ok((table, matrix))
}

fn read_artifact<T: DeserializeOwned>(path: &Path, expected_schema: &str) -> Result<T> {
  let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");

  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      return Err(Error::corrupt(format!("{name} is missing from {}", display_parent(path))));
    }
    Err(e) => return Err(e.into()),
  };

  // Check the schema up front so a stale format gets a clear message
  match serde_json::from_str::<SchemaProbe>(&content) {
    Ok(SchemaProbe { schema: Some(schema) }) if schema == expected_schema => {}
    Ok(SchemaProbe { schema: Some(schema) }) => {
      return Err(Error::corrupt(format!(
        "{name} has schema '{schema}', expected '{expected_schema}'; rebuild the index"
      )));
    }
    Ok(SchemaProbe { schema: None }) => {
      return Err(Error::corrupt(format!("{name} has no schema identifier; rebuild the index")));
    }
    Err(e) => return Err(Error::corrupt(format!("{name} is not valid JSON: {e}"))),
  }

  serde_json::from_str(&content).map_err(|e| Error::corrupt(format!("{name} is malformed: {e}")))
}

fn display_parent(path: &Path) -> String {
  path.parent().map(|p| p.display().to_string()).unwrap_or_default()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
  let tmp = path.with_extension("json.tmp");
  fs::write(&tmp, bytes)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

fn backup_existing(dir: &Path) -> Result<Option<PathBuf>> {
  let existing: Vec<&str> =
    [COURSES_FILE, SIMILARITY_FILE].into_iter().filter(|file| dir.join(file).exists()).collect();

  if existing.is_empty() {
    return Ok(None);
  }

  let stamp = Utc::now().timestamp();
  let mut backup_dir = dir.join(format!("backup-{stamp}"));
  let mut attempt = 1;
  while backup_dir.exists() {
    backup_dir = dir.join(format!("backup-{stamp}-{attempt}"));
    attempt += 1;
  }
  fs::create_dir_all(&backup_dir)?;

  for file in existing {
    fs::rename(dir.join(file), backup_dir.join(file))?;
  }

  info!(backup = %backup_dir.display(), "backed up previous index artifacts");
  prune_backups(dir, MAX_BACKUPS)?;
  Ok(Some(backup_dir))
}

/// `backup-<stamp>` or `backup-<stamp>-<attempt>` as a sortable key
fn backup_key(name: &str) -> Option<(i64, u32)> {
  let rest = name.strip_prefix("backup-")?;
  match rest.split_once('-') {
    Some((stamp, attempt)) => Some((stamp.parse().ok()?, attempt.parse().ok()?)),
    None => Some((rest.parse().ok()?, 0)),
  }
}

/// Delete all but the `keep` newest backup directories in `dir`
fn prune_backups(dir: &Path, keep: usize) -> Result<()> {
  let mut backups: Vec<((i64, u32), PathBuf)> = fs::read_dir(dir)?
    .filter_map(|entry| entry.ok())
    .filter(|entry| entry.path().is_dir())
    .filter_map(|entry| {
      let key = backup_key(&entry.file_name().to_string_lossy())?;
      Some((key, entry.path()))
    })
    .collect();

  if backups.len() <= keep {
    return Ok(());
  }

  backups.sort_by(|a, b| b.0.cmp(&a.0));
  for (_, path) in backups.drain(keep..) {
    fs::remove_dir_all(&path)?;
    debug!(backup = %path.display(), "pruned old index backup");
  }
  Ok(())
}
