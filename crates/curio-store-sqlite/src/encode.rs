//! Conversions between JSON values and SQLite values.

use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// Convert a JSON scalar into a bindable SQLite value.
///
/// Booleans become 0/1. Arrays and objects have no column representation.
pub fn to_sql(column: &str, value: &Value) -> Result<SqlValue> {
  match value {
    Value::Null => Ok(SqlValue::Null),
    Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
    Value::Number(n) => match n.as_i64() {
      Some(i) => Ok(SqlValue::Integer(i)),
      None => n
        .as_f64()
        .map(SqlValue::Real)
        .ok_or_else(|| Error::UnsupportedValue(column.to_owned())),
    },
    Value::String(s) => Ok(SqlValue::Text(s.clone())),
    Value::Array(_) | Value::Object(_) => {
      Err(Error::UnsupportedValue(column.to_owned()))
    }
  }
}

pub fn to_json(value: SqlValue) -> Value {
  match value {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(i) => Value::from(i),
    SqlValue::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
    SqlValue::Text(s) => Value::String(s),
    SqlValue::Blob(bytes) => Value::from(bytes),
  }
}

/// Read the columns of `row` starting at `offset` into a JSON object keyed by
/// `names`.
pub fn row_object(
  row: &rusqlite::Row<'_>,
  offset: usize,
  names: &[&'static str],
) -> rusqlite::Result<Map<String, Value>> {
  let mut object = Map::with_capacity(names.len());
  for (i, name) in names.iter().enumerate() {
    let value = row.get::<_, SqlValue>(offset + i)?;
    object.insert((*name).to_owned(), to_json(value));
  }
  Ok(object)
}
