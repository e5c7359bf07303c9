//! Curio - Content-Based Course Recommendations
//!
//! Builds a TF-IDF cosine-similarity index over a course catalogue once,
//! offline, and serves top-k "courses like this one" lookups from the
//! loaded index.

pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod poster;
pub mod recommender;
pub mod server;
pub mod text;
pub mod tfidf;

pub use error::{Error, Result};
pub use index::{build, Course, CourseTable, SimilarityMatrix};
pub use recommender::{Recommendation, Recommender, DEFAULT_TOP_K};
