//! The `RemoteTableClient` trait and the query types it accepts.
//!
//! The trait is implemented by remote-store backends (`curio-rest` for the
//! hosted service, `curio-store-sqlite` for local emulation). The gateway
//! depends on this abstraction only.

use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::context::AccessToken;

// ─── Tables and columns ─────────────────────────────────────────────────────

/// Remote tables the catalogue reads and writes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Artifacts,
  ArtifactImages,
  ArtifactArImages,
  Likes,
}

impl Table {
  /// The table's name in the remote store, e.g. `artifact_ar_images`.
  pub fn name(self) -> &'static str { self.into() }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
  /// A plain column of the queried table.
  Field(&'static str),
  /// Rows of a related table, nested under the related table's name.
  Embed {
    table:   Table,
    columns: Vec<Column>,
  },
}

/// Equality filter on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: &'static str,
  pub equals: Value,
}

impl Filter {
  pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
    Self { column, equals: value.into() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
  pub column:    &'static str,
  pub ascending: bool,
}

// ─── Query ──────────────────────────────────────────────────────────────────

/// A read against one table, built fluently.
///
/// ```
/// use curio_core::client::{Select, Table};
///
/// let query = Select::table(Table::Artifacts)
///   .columns(["id", "name"])
///   .embed(Table::ArtifactImages, ["id", "url"])
///   .order("name", true);
/// assert_eq!(query.columns.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
  pub table:   Table,
  pub columns: Vec<Column>,
  pub filters: Vec<Filter>,
  pub order:   Option<Order>,
  pub limit:   Option<usize>,
}

impl Select {
  pub fn table(table: Table) -> Self {
    Self {
      table,
      columns: Vec::new(),
      filters: Vec::new(),
      order: None,
      limit: None,
    }
  }

  pub fn columns(
    mut self,
    names: impl IntoIterator<Item = &'static str>,
  ) -> Self {
    self.columns.extend(names.into_iter().map(Column::Field));
    self
  }

  pub fn embed(
    mut self,
    table: Table,
    columns: impl IntoIterator<Item = &'static str>,
  ) -> Self {
    self.columns.push(Column::Embed {
      table,
      columns: columns.into_iter().map(Column::Field).collect(),
    });
    self
  }

  pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
    self.filters.push(Filter::eq(column, value));
    self
  }

  pub fn order(mut self, column: &'static str, ascending: bool) -> Self {
    self.order = Some(Order { column, ascending });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

/// What an insert hands back: the new row's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Inserted {
  pub id: i64,
}

// ─── Trait ──────────────────────────────────────────────────────────────────

/// Abstraction over the remote relational store.
///
/// Every method takes an optional access credential. Without one the call
/// runs under the store's anonymous policy, which permits reads only; with
/// one, the store's row-level policy decides. Implementations surface their
/// own failures through [`RemoteTableClient::Error`] and never retry.
///
/// All methods return `Send` futures so clients can be shared across a
/// multi-threaded runtime.
pub trait RemoteTableClient: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Rows matching `query`, in the order the store returns them.
  fn select<'a>(
    &'a self,
    query: &'a Select,
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send + 'a;

  /// Exactly one row matching `query`; `None` when nothing matches.
  fn select_one<'a>(
    &'a self,
    query: &'a Select,
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Insert one row built from the `values` object.
  fn insert<'a>(
    &'a self,
    table: Table,
    values: Value,
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Inserted, Self::Error>> + Send + 'a;

  /// Set `values` on every row matching all `filters`.
  fn update<'a>(
    &'a self,
    table: Table,
    values: Value,
    filters: &'a [Filter],
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// Remove every row matching all `filters`.
  fn delete<'a>(
    &'a self,
    table: Table,
    filters: &'a [Filter],
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// Insert `values`, or overwrite the row that already holds the same value
  /// in the `conflict_key` column.
  fn upsert<'a>(
    &'a self,
    table: Table,
    values: Value,
    conflict_key: &'a str,
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// Invoke a named remote procedure with a JSON object of arguments.
  fn call<'a>(
    &'a self,
    procedure: &'a str,
    args: Value,
    credential: Option<&'a AccessToken>,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;
}
