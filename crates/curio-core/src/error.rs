//! Error types for `curio-core`.

use thiserror::Error;

use crate::{artifact::ArtifactId, shape::ShapeError};

#[derive(Debug, Error)]
pub enum Error {
  /// The remote store answered with data that does not match the expected
  /// record shape.
  #[error("response shape mismatch: {0}")]
  ShapeValidation(#[from] ShapeError),

  /// A single-row fetch matched nothing.
  #[error("artifact not found: {0}")]
  NotFound(ArtifactId),

  /// Whatever the remote client reported, unchanged.
  #[error("remote error: {0}")]
  Remote(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
