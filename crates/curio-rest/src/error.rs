//! Error type for `curio-rest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The store answered with a non-success status. The body is kept verbatim.
  #[error("remote store returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected response body: {0}")]
  UnexpectedBody(&'static str),
}

pub type Result<T, E = RestError> = std::result::Result<T, E>;
