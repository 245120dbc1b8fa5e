//! [`SqliteStore`]: an in-process emulation of the hosted remote store,
//! implementing [`RemoteTableClient`].

use std::{path::Path, sync::Arc};

use curio_core::{
  client::{Column, Filter, Inserted, RemoteTableClient, Select, Table},
  context::AccessToken,
  gateway::LIKE_PROCEDURE,
};
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value as SqlValue};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{row_object, to_sql},
  schema::{self, Nesting, PARENT_KEY, SCHEMA},
};

// ─── Store ──────────────────────────────────────────────────────────────────

/// The remote catalogue store, backed by a single SQLite file.
///
/// Reads are open to anonymous callers. Writes need a non-blank credential
/// and, when service tokens are configured, one of those tokens.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  tokens: Arc<[String]>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Only accept writes carrying one of `tokens`.
  pub fn with_tokens(mut self, tokens: impl IntoIterator<Item = String>) -> Self {
    self.tokens = tokens.into_iter().collect();
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, tokens: Arc::from(Vec::new()) })
  }

  fn authorize(&self, table: Table, credential: Option<&AccessToken>) -> Result<()> {
    let Some(token) = credential.filter(|t| !t.is_blank()) else {
      return Err(Error::PermissionDenied(table));
    };
    if self.tokens.is_empty() || self.tokens.iter().any(|t| t == token.as_str()) {
      Ok(())
    } else {
      Err(Error::PermissionDenied(table))
    }
  }

  async fn like(&self, args: &Value) -> Result<Value> {
    let artifact_id = args
      .get("artifact_id_to_check")
      .and_then(Value::as_i64)
      .ok_or_else(|| {
        Error::InvalidArgument("artifact_id_to_check must be an integer".into())
      })?;

    let count: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO likes (artifact_id) VALUES (?1)",
          rusqlite::params![artifact_id],
        )?;
        let count = tx.query_row(
          "SELECT COUNT(*) FROM likes WHERE artifact_id = ?1",
          rusqlite::params![artifact_id],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(count)
      })
      .await?;

    Ok(json!(count))
  }
}

// ─── Query planning ─────────────────────────────────────────────────────────

/// A nested child-table read, run once per parent row.
struct EmbedPlan {
  key:     &'static str,
  sql:     String,
  fields:  Vec<&'static str>,
  nesting: Nesting,
}

impl EmbedPlan {
  fn fetch(
    &self,
    conn: &rusqlite::Connection,
    parent_id: i64,
  ) -> rusqlite::Result<Value> {
    let mut stmt = conn.prepare_cached(&self.sql)?;
    match self.nesting {
      Nesting::Count => {
        let count: i64 = stmt.query_row([parent_id], |r| r.get(0))?;
        Ok(json!({ "count": count }))
      }
      Nesting::One => Ok(
        stmt
          .query_row([parent_id], |r| row_object(r, 0, &self.fields))
          .optional()?
          .map_or(Value::Null, Value::Object),
      ),
      Nesting::Many => {
        let rows = stmt
          .query_map([parent_id], |r| row_object(r, 0, &self.fields))?
          .map(|r| r.map(Value::Object))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Value::Array(rows))
      }
    }
  }
}

struct SelectPlan {
  sql:    String,
  params: Vec<SqlValue>,
  fields: Vec<&'static str>,
  embeds: Vec<EmbedPlan>,
}

fn known(table: Table, name: &str) -> Result<&'static str> {
  schema::column(table, name).ok_or_else(|| Error::UnknownColumn {
    table,
    column: name.to_owned(),
  })
}

fn placeholders(start: usize, n: usize) -> String {
  (start + 1..=start + n)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Render ` WHERE a = ?k AND ...` with placeholders numbered after `start`.
fn where_clause(
  table: Table,
  filters: &[Filter],
  start: usize,
) -> Result<(String, Vec<SqlValue>)> {
  if filters.is_empty() {
    return Ok((String::new(), Vec::new()));
  }
  let mut conds = Vec::with_capacity(filters.len());
  let mut params = Vec::with_capacity(filters.len());
  for (i, filter) in filters.iter().enumerate() {
    let column = known(table, filter.column)?;
    conds.push(format!("{column} = ?{}", start + i + 1));
    params.push(to_sql(column, &filter.equals)?);
  }
  Ok((format!(" WHERE {}", conds.join(" AND ")), params))
}

/// Validate a `values` object against `table`, returning the column names and
/// their bound values in matching order.
fn assignments(
  table: Table,
  values: &Value,
) -> Result<(Vec<&'static str>, Vec<SqlValue>)> {
  let object = values
    .as_object()
    .filter(|o| !o.is_empty())
    .ok_or(Error::NotAnObject(table))?;

  let mut columns = Vec::with_capacity(object.len());
  let mut params = Vec::with_capacity(object.len());
  for (name, value) in object {
    let column = known(table, name)?;
    columns.push(column);
    params.push(to_sql(column, value)?);
  }
  Ok((columns, params))
}

fn plan_embed(parent: Table, child: Table, columns: &[Column]) -> Result<EmbedPlan> {
  let nesting = schema::nesting(parent, child)
    .ok_or(Error::UnknownRelation { parent, child })?;

  let names = columns
    .iter()
    .map(|c| match c {
      Column::Field(name) => Ok(*name),
      Column::Embed { table, .. } => {
        Err(Error::UnknownRelation { parent: child, child: *table })
      }
    })
    .collect::<Result<Vec<_>>>()?;

  let (sql, fields) = match nesting {
    Nesting::Count => {
      if names != ["count"] {
        return Err(Error::UnknownColumn { table: child, column: names.join(",") });
      }
      (
        format!("SELECT COUNT(*) FROM {child} WHERE {PARENT_KEY} = ?1"),
        names,
      )
    }
    Nesting::One | Nesting::Many => {
      let fields = names
        .iter()
        .map(|n| known(child, n))
        .collect::<Result<Vec<_>>>()?;
      let limit = if nesting == Nesting::One { " LIMIT 1" } else { "" };
      (
        format!(
          "SELECT {} FROM {child} WHERE {PARENT_KEY} = ?1 ORDER BY id{limit}",
          fields.join(", ")
        ),
        fields,
      )
    }
  };

  Ok(EmbedPlan { key: child.name(), sql, fields, nesting })
}

fn plan_select(query: &Select) -> Result<SelectPlan> {
  let table = query.table;
  let mut fields = Vec::new();
  let mut embeds = Vec::new();
  for column in &query.columns {
    match column {
      Column::Field(name) => fields.push(known(table, name)?),
      Column::Embed { table: child, columns } => {
        embeds.push(plan_embed(table, *child, columns)?);
      }
    }
  }

  // The primary key always comes first so embeds can join on it.
  let select_list = std::iter::once("id")
    .chain(fields.iter().copied())
    .collect::<Vec<_>>()
    .join(", ");
  let (where_sql, params) = where_clause(table, &query.filters, 0)?;
  let mut sql = format!("SELECT {select_list} FROM {table}{where_sql}");

  if let Some(order) = query.order {
    let column = known(table, order.column)?;
    let direction = if order.ascending { "ASC" } else { "DESC" };
    sql.push_str(&format!(" ORDER BY {column} {direction}"));
  }
  if let Some(limit) = query.limit {
    sql.push_str(&format!(" LIMIT {limit}"));
  }

  Ok(SelectPlan { sql, params, fields, embeds })
}

// ─── RemoteTableClient impl ─────────────────────────────────────────────────

impl RemoteTableClient for SqliteStore {
  type Error = Error;

  async fn select(
    &self,
    query: &Select,
    _credential: Option<&AccessToken>,
  ) -> Result<Vec<Value>> {
    let plan = plan_select(query)?;
    debug!(sql = %plan.sql, embeds = plan.embeds.len(), "select");

    let rows = self
      .conn
      .call(move |conn| {
        let conn: &rusqlite::Connection = conn;
        let mut stmt = conn.prepare(&plan.sql)?;
        let mut rows = stmt.query(params_from_iter(plan.params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
          let id: i64 = row.get(0)?;
          let mut object = row_object(row, 1, &plan.fields)?;
          for embed in &plan.embeds {
            object.insert(embed.key.to_owned(), embed.fetch(conn, id)?);
          }
          out.push(Value::Object(object));
        }
        Ok(out)
      })
      .await?;

    Ok(rows)
  }

  async fn select_one(
    &self,
    query: &Select,
    credential: Option<&AccessToken>,
  ) -> Result<Option<Value>> {
    let rows = self.select(query, credential).await?;
    Ok(rows.into_iter().next())
  }

  async fn insert(
    &self,
    table: Table,
    values: Value,
    credential: Option<&AccessToken>,
  ) -> Result<Inserted> {
    self.authorize(table, credential)?;
    let (columns, params) = assignments(table, &values)?;
    let sql = format!(
      "INSERT INTO {table} ({}) VALUES ({})",
      columns.join(", "),
      placeholders(0, columns.len())
    );
    debug!(%sql, "insert");

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(params))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Inserted { id })
  }

  async fn update(
    &self,
    table: Table,
    values: Value,
    filters: &[Filter],
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    self.authorize(table, credential)?;
    if filters.is_empty() {
      return Err(Error::MissingFilter { action: "update", table });
    }
    let (columns, mut params) = assignments(table, &values)?;
    let (where_sql, filter_params) = where_clause(table, filters, columns.len())?;
    params.extend(filter_params);

    let set = columns
      .iter()
      .enumerate()
      .map(|(i, c)| format!("{c} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("UPDATE {table} SET {set}{where_sql}");
    debug!(%sql, "update");

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(params))?;
        Ok(())
      })
      .await?;

    Ok(Value::Null)
  }

  async fn delete(
    &self,
    table: Table,
    filters: &[Filter],
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    self.authorize(table, credential)?;
    if filters.is_empty() {
      return Err(Error::MissingFilter { action: "delete", table });
    }
    let (where_sql, params) = where_clause(table, filters, 0)?;
    let sql = format!("DELETE FROM {table}{where_sql}");
    debug!(%sql, "delete");

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(params))?;
        Ok(())
      })
      .await?;

    Ok(Value::Null)
  }

  async fn upsert(
    &self,
    table: Table,
    values: Value,
    conflict_key: &str,
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    self.authorize(table, credential)?;
    let key = known(table, conflict_key)?;
    let (columns, params) = assignments(table, &values)?;
    if !columns.contains(&key) {
      return Err(Error::InvalidArgument(format!(
        "upsert values must include the conflict key {key:?}"
      )));
    }

    let updates = columns
      .iter()
      .filter(|c| **c != key)
      .map(|c| format!("{c} = excluded.{c}"))
      .collect::<Vec<_>>();
    let action = if updates.is_empty() {
      "DO NOTHING".to_owned()
    } else {
      format!("DO UPDATE SET {}", updates.join(", "))
    };
    let sql = format!(
      "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT({key}) {action}",
      columns.join(", "),
      placeholders(0, columns.len())
    );
    debug!(%sql, "upsert");

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(params))?;
        Ok(())
      })
      .await?;

    Ok(Value::Null)
  }

  async fn call(
    &self,
    procedure: &str,
    args: Value,
    _credential: Option<&AccessToken>,
  ) -> Result<Value> {
    debug!(procedure, "rpc");
    match procedure {
      LIKE_PROCEDURE => self.like(&args).await,
      other => Err(Error::UnknownProcedure(other.to_owned())),
    }
  }
}
