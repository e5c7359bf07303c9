//! Status and version endpoint handlers

use axum::{http::StatusCode, response::Json};
use uuid::Uuid;

use crate::server::types::{BaseResponse, VersionResponse};

/// GET /status - Health check endpoint
pub async fn status() -> StatusCode {
  StatusCode::OK
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let transaction_id = Uuid::new_v4();
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };

  Json(BaseResponse::success(response, transaction_id))
}
