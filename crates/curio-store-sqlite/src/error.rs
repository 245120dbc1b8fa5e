//! Error type for `curio-store-sqlite`.

use curio_core::client::Table;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A write was attempted without an accepted credential.
  #[error("permission denied for table {0}")]
  PermissionDenied(Table),

  #[error("column {column:?} does not exist on {table}")]
  UnknownColumn { table: Table, column: String },

  #[error("could not find a relationship between {parent} and {child}")]
  UnknownRelation { parent: Table, child: Table },

  #[error("unknown procedure: {0}")]
  UnknownProcedure(String),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("row values for {0} must be a non-empty JSON object")]
  NotAnObject(Table),

  #[error("value for column {0:?} cannot be stored")]
  UnsupportedValue(String),

  /// Updates and deletes must name at least one filter.
  #[error("refusing to {action} every row of {table}")]
  MissingFilter { action: &'static str, table: Table },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
