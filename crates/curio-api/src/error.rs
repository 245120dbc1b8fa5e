//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable bearer credential on a write route.
  #[error("missing or empty bearer token")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A write payload with a blank required field.
  #[error("{0} cannot be empty")]
  EmptyField(&'static str),

  #[error(transparent)]
  Gateway(#[from] curio_core::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::EmptyField(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Gateway(curio_core::Error::NotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Gateway(curio_core::Error::ShapeValidation(_)) => {
        StatusCode::BAD_GATEWAY
      }
      ApiError::Gateway(curio_core::Error::Remote(_)) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    match &self {
      // The store's data broke its own contract.
      ApiError::Gateway(curio_core::Error::ShapeValidation(_)) => {
        warn!(%status, error = %self, "request failed");
      }
      // Includes policy rejections of the caller's credential.
      ApiError::Gateway(curio_core::Error::Remote(_)) => {
        info!(%status, error = %self, "remote store refused request");
      }
      _ => {}
    }
    let mut res =
      (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
