//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{envelope::Envelope, extract::Json};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] accolade_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("upload failed: {0}")]
  Io(#[from] std::io::Error),
}

// Extractor rejections all answer 400.

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl ApiError {
  fn status_and_kind(&self) -> (StatusCode, &'static str) {
    use accolade_core::Error as E;
    match self {
      Self::Core(E::Validation(_)) | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation"),
      Self::Core(E::InvalidState { .. }) => (StatusCode::BAD_REQUEST, "invalid_state"),
      Self::Core(E::Unauthorized(_)) => (StatusCode::UNAUTHORIZED, "unauthorized"),
      Self::Core(E::Forbidden(_)) => (StatusCode::FORBIDDEN, "forbidden"),
      Self::Core(E::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
      Self::Core(E::Store(_)) | Self::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind) = self.status_and_kind();
    let message = if status.is_server_error() {
      error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };
    (status, Json(Envelope::failure(kind, message))).into_response()
  }
}
