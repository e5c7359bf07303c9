//! TF-IDF vectorization over a tokenized corpus
//!
//! Term frequency is the raw count of a term in a document. Inverse document
//! frequency is smoothed as `ln((1 + n) / (1 + df)) + 1`, so a term present
//! in every document still carries weight. Every document vector is scaled
//! to unit length, which makes cosine similarity a plain dot product.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default cap on the number of terms kept in the vocabulary
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Sparse vector with entries sorted by term index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
  entries: Vec<(usize, f64)>,
}

impl SparseVector {
  pub fn entries(&self) -> &[(usize, f64)] {
    &self.entries
  }

  pub fn is_zero(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn norm(&self) -> f64 {
    self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
  }

  /// Dot product by merging the two sorted entry lists
  pub fn dot(&self, other: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;

    while i < self.entries.len() && j < other.entries.len() {
      let (a_idx, a_weight) = self.entries[i];
      let (b_idx, b_weight) = other.entries[j];
      match a_idx.cmp(&b_idx) {
        Ordering::Less => i += 1,
        Ordering::Greater => j += 1,
        Ordering::Equal => {
          sum += a_weight * b_weight;
          i += 1;
          j += 1;
        }
      }
    }

    sum
  }

  fn normalized(mut self) -> Self {
    let norm = self.norm();
    if norm > 0.0 {
      for (_, weight) in &mut self.entries {
        *weight /= norm;
      }
    }
    self
  }
}

/// Terms kept after capping, indexed alphabetically, with their idf weights
#[derive(Debug, Clone)]
pub struct Vocabulary {
  terms: Vec<String>,
  index: HashMap<String, usize>,
  idf: Vec<f64>,
}

impl Vocabulary {
  pub fn len(&self) -> usize {
    self.terms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.terms.is_empty()
  }

  pub fn terms(&self) -> &[String] {
    &self.terms
  }

  pub fn idf(&self, term: &str) -> Option<f64> {
    self.index.get(term).map(|&i| self.idf[i])
  }
}

/// Fitted vocabulary plus one unit-length vector per document
#[derive(Debug, Clone)]
pub struct TfidfModel {
  pub vocabulary: Vocabulary,
  pub vectors: Vec<SparseVector>,
}

/// Fit a vocabulary on the corpus and vectorize every document
pub fn fit_transform(documents: &[Vec<String>], max_features: usize) -> TfidfModel {
  let document_frequency = count_document_frequency(documents);
  let vocabulary = select_vocabulary(document_frequency, documents.len(), max_features);

  let vectors = documents.iter().map(|tokens| vectorize(&vocabulary, tokens)).collect();

  TfidfModel { vocabulary, vectors }
}

fn count_document_frequency(documents: &[Vec<String>]) -> HashMap<&str, usize> {
  let mut frequency: HashMap<&str, usize> = HashMap::new();
  for tokens in documents {
    let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
    for term in distinct {
      *frequency.entry(term).or_insert(0) += 1;
    }
  }
  frequency
}

/// Keep the `max_features` most frequent terms; ties go to the alphabetically first term
fn select_vocabulary(
  document_frequency: HashMap<&str, usize>,
  document_count: usize,
  max_features: usize,
) -> Vocabulary {
  let mut ranked: Vec<(&str, usize)> = document_frequency.into_iter().collect();
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
  ranked.truncate(max_features);
  ranked.sort_by(|a, b| a.0.cmp(b.0));

  let n = document_count as f64;
  let idf = ranked.iter().map(|&(_, df)| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0).collect();
  let terms: Vec<String> = ranked.iter().map(|&(term, _)| term.to_string()).collect();
  let index = terms.iter().enumerate().map(|(i, term)| (term.clone(), i)).collect();

  Vocabulary { terms, index, idf }
}

fn vectorize(vocabulary: &Vocabulary, tokens: &[String]) -> SparseVector {
  let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
  for token in tokens {
    if let Some(&i) = vocabulary.index.get(token) {
      *counts.entry(i).or_insert(0.0) += 1.0;
    }
  }

  let entries = counts.into_iter().map(|(i, tf)| (i, tf * vocabulary.idf[i])).collect();
  SparseVector { entries }.normalized()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn docs(texts: &[&str]) -> Vec<Vec<String>> {
    texts.iter().map(|t| t.split_whitespace().map(str::to_string).collect()).collect()
  }

  #[test]
  fn test_vectors_are_unit_length() {
    let model = fit_transform(&docs(&["rust systems rust", "python data", "data science python"]), 100);

    for vector in &model.vectors {
      assert!((vector.norm() - 1.0).abs() < 1e-12);
    }
  }

  #[test]
  fn test_empty_document_stays_zero() {
    let model = fit_transform(&docs(&["rust systems", ""]), 100);

    assert!(model.vectors[1].is_zero());
    assert_eq!(model.vectors[1].norm(), 0.0);
  }

  #[test]
  fn test_rare_terms_weigh_more() {
    let model = fit_transform(&docs(&["common rare", "common", "common"]), 100);

    let common = model.vocabulary.idf("common").unwrap();
    let rare = model.vocabulary.idf("rare").unwrap();
    assert!(rare > common);
    // Term present everywhere keeps the smoothing floor of 1.0
    assert!((common - 1.0).abs() < 1e-12);
  }

  #[test]
  fn test_vocabulary_cap_keeps_highest_document_frequency() {
    let model = fit_transform(&docs(&["alpha beta gamma", "beta gamma", "gamma delta"]), 2);

    assert_eq!(model.vocabulary.terms(), &["beta".to_string(), "gamma".to_string()]);
    assert!(model.vocabulary.idf("alpha").is_none());
    assert!(model.vocabulary.idf("delta").is_none());
  }

  #[test]
  fn test_vocabulary_cap_breaks_ties_alphabetically() {
    let model = fit_transform(&docs(&["zeta yak", "xray walrus"]), 3);
    assert_eq!(model.vocabulary.terms(), &["walrus".to_string(), "xray".to_string(), "yak".to_string()]);
  }

  #[test]
  fn test_dot_of_unit_vector_with_itself_is_one() {
    let model = fit_transform(&docs(&["machine learning course", "deep learning"]), 100);

    let v = &model.vectors[0];
    assert!((v.dot(v) - 1.0).abs() < 1e-12);
    assert!(model.vectors[0].dot(&model.vectors[1]) > 0.0);
  }

  #[test]
  fn test_disjoint_documents_have_zero_dot() {
    let model = fit_transform(&docs(&["cloud deployment", "mobile android"]), 100);
    assert_eq!(model.vectors[0].dot(&model.vectors[1]), 0.0);
  }
}
