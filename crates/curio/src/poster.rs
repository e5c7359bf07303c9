//! Poster lookup for recommended courses
//!
//! Resolving a poster never fails: anything short of a usable image URL
//! yields the placeholder, so a broken image link can never hold back a
//! recommendation.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

#[cfg(test)]
use mockall::automock;

use crate::index::Course;

pub const DEFAULT_PLACEHOLDER: &str =
  "https://upload.wikimedia.org/wikipedia/commons/1/14/No_Image_Available.jpg";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget for resolving every poster in one response
pub const BATCH_DEADLINE: Duration = Duration::from_secs(3);
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
  (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PosterResolver: Send + Sync {
  /// Image URL to show for `course`
  async fn resolve(&self, course: &Course) -> String;
}

fn is_web_url(url: &str) -> bool {
  url.starts_with("http://") || url.starts_with("https://")
}

/// Uses the poster stored with the course, or the placeholder
#[derive(Debug, Clone)]
pub struct StaticPosterResolver {
  placeholder: String,
}

impl StaticPosterResolver {
  pub fn new(placeholder: impl Into<String>) -> Self {
    Self { placeholder: placeholder.into() }
  }
}

impl Default for StaticPosterResolver {
  fn default() -> Self {
    Self::new(DEFAULT_PLACEHOLDER)
  }
}

#[async_trait]
impl PosterResolver for StaticPosterResolver {
  async fn resolve(&self, course: &Course) -> String {
    let poster = course.poster.trim();
    if is_web_url(poster) {
      poster.to_string()
    } else {
      self.placeholder.clone()
    }
  }
}

/// Like [`StaticPosterResolver`], but confirms the image answers a HEAD request
#[derive(Debug, Clone)]
pub struct HttpPosterResolver {
  client: reqwest::Client,
  placeholder: String,
}

impl HttpPosterResolver {
  pub fn new(placeholder: impl Into<String>) -> reqwest::Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).default_headers(headers).build()?;
    Ok(Self { client, placeholder: placeholder.into() })
  }
}

#[async_trait]
impl PosterResolver for HttpPosterResolver {
  async fn resolve(&self, course: &Course) -> String {
    let poster = course.poster.trim();
    if !is_web_url(poster) {
      return self.placeholder.clone();
    }

    match self.client.head(poster).send().await {
      Ok(response) if response.status().is_success() => poster.to_string(),
      Ok(response) => {
        warn!(course = %course.title, status = %response.status(), "poster request failed");
        self.placeholder.clone()
      }
      Err(e) => {
        warn!(course = %course.title, error = %e, "poster request failed");
        self.placeholder.clone()
      }
    }
  }
}

/// Resolve posters for several courses concurrently, preserving order.
///
/// Lookups still pending when `deadline` elapses get `placeholder`.
pub async fn resolve_all(
  resolver: &dyn PosterResolver,
  courses: &[&Course],
  placeholder: &str,
  deadline: Duration,
) -> Vec<String> {
  let expires = Instant::now() + deadline;

  let lookups = courses.iter().map(|course| async move {
    match timeout_at(expires, resolver.resolve(course)).await {
      Ok(poster) => poster,
      Err(_) => {
        warn!(course = %course.title, "poster lookup ran past the deadline");
        placeholder.to_string()
      }
    }
  });

  join_all(lookups).await
}
