//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::{serve, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::commands::poster_resolver;
use crate::config::Config;
use crate::recommender::Recommender;
use crate::server::routing::{create_router, AppState};

/// Load the index and assemble the application.
///
/// Fails if the index is missing or inconsistent, so the server never
/// starts in a degraded state.
pub fn build_app(config: &Config) -> Result<Router> {
  let recommender = Recommender::load(&config.index_dir)
    .with_context(|| format!("Failed to load index from {}", config.index_dir.display()))?;
  info!(courses = recommender.len(), dir = %config.index_dir.display(), "loaded course index");

  let state = AppState {
    recommender: Arc::new(recommender),
    posters: Arc::from(poster_resolver(config)?),
    placeholder: config.poster_placeholder.clone(),
    top_k: config.top_k,
  };

  Ok(create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  ))
}

/// Start the REST server
pub async fn start_server(config: &Config) -> Result<()> {
  let app = build_app(config)?;

  let listener = TcpListener::bind(config.bind).await?;
  info!("Server listening on {}", config.bind);

  serve(listener, app).await.context("Server error")?;
  info!("Server shutdown gracefully");
  Ok(())
}
