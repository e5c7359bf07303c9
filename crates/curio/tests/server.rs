use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tower::ServiceExt;

use curio::config::Config;
use curio::dataset::{self, RawCourse};
use curio::index::{self, Course};
use curio::poster::{PosterResolver, BATCH_DEADLINE};
use curio::recommender::Recommender;
use curio::server::routing::{create_router, AppState};
use curio::server::startup::build_app;

fn app_for(records: &[RawCourse], temp: &TempDir) -> Router {
    let (table, matrix) = index::build(records, 5000).unwrap();
    index::save(temp.path(), &table, &matrix, false).unwrap();

    let config = Config { index_dir: temp.path().to_path_buf(), top_k: 2, ..Config::default() };
    build_app(&config).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_status_and_version() {
    let temp = TempDir::new().unwrap();
    let app = app_for(&dataset::sample(), &temp);

    let (status, _) = send(app.clone(), Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, Request::get("/version").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["transaction_id"].is_string());
}

#[tokio::test]
async fn test_list_courses() {
    let temp = TempDir::new().unwrap();
    let app = app_for(&dataset::sample(), &temp);

    let (status, body) = send(app, Request::get("/courses").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 9);
    assert_eq!(courses[0]["id"], 0);
    assert_eq!(courses[0]["title"], "Machine Learning by Andrew Ng");
}

#[tokio::test]
async fn test_recommend_uses_default_k_and_ranks() {
    let temp = TempDir::new().unwrap();
    let records = vec![
        RawCourse::new("A", "rust ownership borrowing lifetimes"),
        RawCourse::new("B", "rust ownership borrowing cooking"),
        RawCourse::new("C", "rust ownership gardening painting"),
        RawCourse::new("D", "rust knitting pottery sailing"),
    ];
    let app = app_for(&records, &temp);

    let (status, body) = send(app.clone(), post_json("/recommend", json!({"title": "A"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["title"], "A");

    let titles: Vec<&str> =
        body["recommendations"].as_array().unwrap().iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["B", "C"]);

    let (_, body) = send(app, post_json("/recommend", json!({"title": "a", "k": 10}))).await;
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_recommend_substitutes_placeholder_poster() {
    let temp = TempDir::new().unwrap();
    let records = vec![
        RawCourse::new("Rust Basics", "rust ownership").with_links("https://example.com/rust", "not-a-url"),
        RawCourse::new("Rust Advanced", "rust ownership lifetimes"),
    ];
    let app = app_for(&records, &temp);

    let (status, body) = send(app, post_json("/recommend", json!({"title": "Rust Advanced"}))).await;
    assert_eq!(status, StatusCode::OK);

    let first = &body["recommendations"][0];
    assert_eq!(first["title"], "Rust Basics");
    assert_eq!(first["url"], "https://example.com/rust");
    assert_eq!(first["poster"], curio::poster::DEFAULT_PLACEHOLDER);
    assert!(first["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_recommend_unknown_course_is_not_found() {
    let temp = TempDir::new().unwrap();
    let app = app_for(&dataset::sample(), &temp);

    let (status, body) = send(app.clone(), post_json("/recommend", json!({"title": "this title does not exist"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["key"], "unknown_course");

    // A failed request leaves the service untouched
    let (status, _) = send(app, post_json("/recommend", json!({"title": "Python for Everybody"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_recommend_malformed_body_uses_error_envelope() {
    let temp = TempDir::new().unwrap();
    let app = app_for(&dataset::sample(), &temp);

    let (status, body) = send(app.clone(), post_json("/recommend", json!({"k": 2}))).await;
    assert!(status.is_client_error());
    assert_eq!(body["errors"][0]["key"], "invalid_request");
    assert!(body["transaction_id"].is_string());

    let request = Request::post("/recommend")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["key"], "invalid_request");
}

/// Never answers for courses whose stored poster points at the hung host
struct HungHostResolver;

#[async_trait]
impl PosterResolver for HungHostResolver {
    async fn resolve(&self, course: &Course) -> String {
        if course.poster.contains("hung.example") {
            std::future::pending::<()>().await;
        }
        course.poster.clone()
    }
}

#[tokio::test]
async fn test_recommend_is_not_held_up_by_stuck_posters() {
    let temp = TempDir::new().unwrap();
    let records = vec![
        RawCourse::new("A", "rust ownership borrowing").with_links("", "https://hung.example/a.png"),
        RawCourse::new("B", "rust ownership lifetimes").with_links("", "https://hung.example/b.png"),
        RawCourse::new("C", "rust ownership traits").with_links("", "https://img.example/c.png"),
    ];
    let (table, matrix) = index::build(&records, 5000).unwrap();
    let state = AppState {
        recommender: Arc::new(Recommender::new(table, matrix).unwrap()),
        posters: Arc::new(HungHostResolver),
        placeholder: "placeholder.png".to_string(),
        top_k: 5,
    };
    let app = create_router(state);

    let started = Instant::now();
    let (status, body) = send(app, post_json("/recommend", json!({"title": "A"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(started.elapsed() < BATCH_DEADLINE + Duration::from_secs(2), "took {:?}", started.elapsed());

    assert_eq!(body["course"]["poster"], "placeholder.png");
    let posters: Vec<(&str, &str)> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["title"].as_str().unwrap(), r["poster"].as_str().unwrap()))
        .collect();
    assert!(posters.contains(&("B", "placeholder.png")));
    assert!(posters.contains(&("C", "https://img.example/c.png")));
}

#[test]
fn test_build_app_refuses_missing_index() {
    let temp = TempDir::new().unwrap();
    let config = Config { index_dir: temp.path().join("nothing-here"), ..Config::default() };

    let error = build_app(&config).err().expect("startup must fail");
    assert!(format!("{error:#}").contains("Corrupt course index"));
}
