//! REST API for the course recommender
//!
//! Serves recommendations over HTTP from a recommender loaded once at
//! startup. Uses axum for routing and schemars for schema generation.

pub mod handlers;
pub mod routing;
pub mod startup;
pub mod types;
