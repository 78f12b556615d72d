//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as `{"type": .., "error": ..}`; validation failures
//! add a `details` array with one entry per violated rule.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request could not be decoded (bad JSON, bad path or query).
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Lookup { .. } => StatusCode::FAILED_DEPENDENCY,
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Core(e) => e.kind(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = match &self {
      ApiError::Core(CoreError::Validation(violations)) => json!({
        "type":    self.kind(),
        "error":   "validation failed",
        "details": violations,
      }),
      _ => json!({ "type": self.kind(), "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
