//! Axum router configuration for all endpoints

use axum::{
  routing::{get, post},
  Router,
};
use std::sync::Arc;

use crate::poster::PosterResolver;
use crate::recommender::Recommender;
use crate::server::handlers::{courses, status};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
  pub recommender: Arc<Recommender>,
  pub posters: Arc<dyn PosterResolver>,
  pub placeholder: String,
  pub top_k: usize,
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    // Course endpoints
    .route("/courses", get(courses::list_courses))
    .route("/recommend", post(courses::recommend))
    .with_state(state)
}
