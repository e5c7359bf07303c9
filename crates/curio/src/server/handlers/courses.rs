//! Course listing and recommendation handlers

use axum::{
  extract::{rejection::JsonRejection, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Error;
use crate::index::Course;
use crate::poster::{self, PosterResolver, StaticPosterResolver};
use crate::server::routing::AppState;
use crate::server::types::{
  ApiError, BaseResponse, CourseData, ListCoursesResponse, RecommendRequest, RecommendResponse,
  RecommendationData,
};

type ErrorResponse = (StatusCode, ResponseJson<BaseResponse<()>>);

fn error_response(error: &Error, transaction_id: Uuid) -> ErrorResponse {
  let (status, key) = match error {
    Error::UnknownCourse { .. } => (StatusCode::NOT_FOUND, "unknown_course"),
    _ => (StatusCode::INTERNAL_SERVER_ERROR, "recommendation_failed"),
  };

  let error = ApiError::new(key, &error.to_string());
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

fn rejection_response(rejection: &JsonRejection, transaction_id: Uuid) -> ErrorResponse {
  let error = ApiError::new("invalid_request", &rejection.body_text());
  (rejection.status(), ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// GET /courses - List every indexed course
pub async fn list_courses(State(state): State<AppState>) -> ResponseJson<BaseResponse<ListCoursesResponse>> {
  let transaction_id = Uuid::new_v4();
  let posters = StaticPosterResolver::new(state.placeholder.clone());

  let mut courses = Vec::with_capacity(state.recommender.len());
  for course in state.recommender.courses() {
    courses.push(CourseData::from_course(course, posters.resolve(course).await));
  }

  ResponseJson(BaseResponse::success(ListCoursesResponse { courses }, transaction_id))
}

/// POST /recommend - Courses most similar to the requested one
pub async fn recommend(
  State(state): State<AppState>,
  request: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<ResponseJson<BaseResponse<RecommendResponse>>, ErrorResponse> {
  let transaction_id = Uuid::new_v4();
  let Json(request) = request.map_err(|rejection| {
    warn!(%transaction_id, error = %rejection.body_text(), "malformed recommendation request");
    rejection_response(&rejection, transaction_id)
  })?;
  let k = request.k.unwrap_or(state.top_k);

  let ranked = match state.recommender.recommend_scored(&request.title, k) {
    Ok(ranked) => ranked,
    Err(e) => {
      warn!(%transaction_id, title = %request.title, error = %e, "recommendation request failed");
      return Err(error_response(&e, transaction_id));
    }
  };
  let query = state.recommender.course(&request.title).map_err(|e| error_response(&e, transaction_id))?;

  // The queried course goes first so all posters resolve in one batch
  let courses: Vec<&Course> = std::iter::once(query)
    .chain(ranked.iter().filter_map(|r| state.recommender.course_by_id(r.id)))
    .collect();
  let mut posters =
    poster::resolve_all(state.posters.as_ref(), &courses, &state.placeholder, poster::BATCH_DEADLINE)
      .await
      .into_iter();
  let query_poster = posters.next().unwrap_or_else(|| state.placeholder.clone());

  let recommendations = ranked
    .iter()
    .zip(courses.iter().skip(1))
    .zip(posters)
    .map(|((recommendation, course), poster)| RecommendationData {
      course: CourseData::from_course(course, poster),
      score: recommendation.score,
    })
    .collect::<Vec<_>>();

  info!(%transaction_id, title = %query.title, returned = recommendations.len(), "served recommendations");

  let course = CourseData::from_course(query, query_poster);
  Ok(ResponseJson(BaseResponse::success(RecommendResponse { course, recommendations }, transaction_id)))
}
