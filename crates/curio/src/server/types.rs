//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::index::Course;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,
}

// Status/Version Endpoints
// =======================

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  /// Current API version
  pub version: String,
}

// Course Endpoints
// ================

/// A course as presented to API clients
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CourseData {
  pub id: usize,
  pub title: String,
  pub url: String,
  pub poster: String,
  pub description: String,
}

impl CourseData {
  /// Present a course with an already resolved poster
  pub fn from_course(course: &Course, poster: String) -> Self {
    Self {
      id: course.id,
      title: course.title.clone(),
      url: course.url.clone(),
      poster,
      description: course.description.clone(),
    }
  }
}

/// Response for /courses endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListCoursesResponse {
  /// Every course in the index, in id order
  pub courses: Vec<CourseData>,
}

/// Request for /recommend endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendRequest {
  /// Title of the course to find neighbours for
  pub title: String,

  /// Number of recommendations (server default when omitted)
  #[serde(default)]
  pub k: Option<usize>,
}

/// A recommended course with its similarity to the query
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationData {
  #[serde(flatten)]
  pub course: CourseData,

  /// Cosine similarity to the queried course
  pub score: f64,
}

/// Response for /recommend endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendResponse {
  /// The course the recommendations were computed for
  pub course: CourseData,

  /// Recommendations, most similar first
  pub recommendations: Vec<RecommendationData>,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { transaction_id, errors, data: () }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string() }
  }
}
