use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::text;

/// One course record as it appears in a raw dataset snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCourse {
  #[serde(alias = "name")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tags: Vec<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub skills: Vec<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub url: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub poster: String,
}

/// Tabular exports write `null` for empty cells; treat it like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RawCourse {
  pub fn new(title: &str, description: &str) -> Self {
    Self { title: title.to_string(), description: description.to_string(), ..Default::default() }
  }

  pub fn with_tags(mut self, tags: &[&str]) -> Self {
    self.tags = tags.iter().map(|t| t.to_string()).collect();
    self
  }

  pub fn with_links(mut self, url: &str, poster: &str) -> Self {
    self.url = url.to_string();
    self.poster = poster.to_string();
    self
  }

  /// Text the vectorizer sees for this course
  pub fn feature_text(&self) -> String {
    let fields = std::iter::once(self.title.as_str())
      .chain(std::iter::once(self.description.as_str()))
      .chain(self.tags.iter().map(String::as_str))
      .chain(self.skills.iter().map(String::as_str));
    text::feature_text(fields)
  }
}

/// Load a dataset snapshot from a JSON or YAML file (chosen by extension)
pub fn load(path: &Path) -> Result<Vec<RawCourse>> {
  let content = fs::read_to_string(path)?;

  let courses: Vec<RawCourse> = match path.extension().and_then(|e| e.to_str()) {
    Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
    _ => serde_json::from_str(&content)?,
  };

  debug!(path = %path.display(), records = courses.len(), "loaded dataset");
  Ok(courses)
}

/// Built-in dataset used when no snapshot has been prepared yet
pub fn sample() -> Vec<RawCourse> {
  vec![
    RawCourse::new(
      "Machine Learning by Andrew Ng",
      "Learn machine learning fundamentals and applications",
    )
    .with_links(
      "https://www.coursera.org/learn/machine-learning",
      "https://images.unsplash.com/photo-1555949963-aa79dcee981c?w=400",
    ),
    RawCourse::new("Python for Everybody", "Beginner-friendly Python programming course").with_links(
      "https://www.coursera.org/specializations/python",
      "https://images.unsplash.com/photo-1542831371-29b0f74f9713?w=400",
    ),
    RawCourse::new("Data Science Fundamentals", "Comprehensive data science and analysis course")
      .with_links(
        "https://www.coursera.org/specializations/jhu-data-science",
        "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=400",
      ),
    RawCourse::new("Deep Learning Specialization", "Advanced neural networks and deep learning")
      .with_links(
        "https://www.coursera.org/specializations/deep-learning",
        "https://images.unsplash.com/photo-1725002327301-06d0a9396e8f?w=400",
      ),
    RawCourse::new("Web Development Bootcamp", "Full-stack web development course").with_links(
      "https://www.coursera.org/specializations/web-design",
      "https://images.unsplash.com/photo-1627398242454-45a1465c2479?w=400",
    ),
    RawCourse::new("Artificial Intelligence A-Z", "Learn AI concepts and practical applications")
      .with_links(
        "https://www.coursera.org/learn/ai",
        "https://images.unsplash.com/photo-1677442136019-21780ecad995?w=400",
      ),
    RawCourse::new("Cloud Computing Basics", "Introduction to cloud services and deployment")
      .with_links(
        "https://www.coursera.org/learn/cloud-computing",
        "https://images.unsplash.com/photo-1544197150-b99a580bb7a8?w=400",
      ),
    RawCourse::new("Mobile App Development", "Build mobile applications for iOS and Android")
      .with_links(
        "https://www.coursera.org/learn/mobile-app-development",
        "https://images.unsplash.com/photo-1512941937669-90a1b58e7e9c?w=400",
      ),
    RawCourse::new("Cybersecurity Fundamentals", "Learn essential cybersecurity principles").with_links(
      "https://www.coursera.org/learn/cybersecurity-basics",
      "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=400",
    ),
  ]
}
