//! Rendering of [`Select`] and [`Filter`] into PostgREST query parameters.

use curio_core::client::{Column, Filter, Order, Select};
use serde_json::Value;

/// `select=` list, with embeds written as `table(col,col)`.
pub fn select_list(columns: &[Column]) -> String {
  if columns.is_empty() {
    return "*".to_owned();
  }
  columns
    .iter()
    .map(|column| match column {
      Column::Field(name) => (*name).to_owned(),
      Column::Embed { table, columns } => {
        format!("{}({})", table.name(), select_list(columns))
      }
    })
    .collect::<Vec<_>>()
    .join(",")
}

/// One `column=op.value` pair per filter. JSON null filters with `is.null`.
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
  filters
    .iter()
    .map(|f| {
      let condition = match &f.equals {
        Value::Null => "is.null".to_owned(),
        other => format!("eq.{}", scalar(other)),
      };
      (f.column.to_owned(), condition)
    })
    .collect()
}

pub fn order_param(order: Order) -> String {
  let direction = if order.ascending { "asc" } else { "desc" };
  format!("{}.{direction}", order.column)
}

/// All query parameters for a read.
pub fn select_pairs(query: &Select) -> Vec<(String, String)> {
  let mut pairs = vec![("select".to_owned(), select_list(&query.columns))];
  pairs.extend(filter_pairs(&query.filters));
  if let Some(order) = query.order {
    pairs.push(("order".to_owned(), order_param(order)));
  }
  if let Some(limit) = query.limit {
    pairs.push(("limit".to_owned(), limit.to_string()));
  }
  pairs
}

fn scalar(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use curio_core::client::Table;

  use super::*;

  fn pair(k: &str, v: &str) -> (String, String) { (k.to_owned(), v.to_owned()) }

  #[test]
  fn listing_query_renders_embed_and_order() {
    let query = Select::table(Table::Artifacts)
      .columns(["id", "name", "object_id"])
      .embed(Table::ArtifactImages, ["id", "caption", "url"])
      .order("name", true);

    assert_eq!(select_pairs(&query), [
      pair("select", "id,name,object_id,artifact_images(id,caption,url)"),
      pair("order", "name.asc"),
    ]);
  }

  #[test]
  fn detail_query_renders_filter_and_limit() {
    let query = Select::table(Table::Artifacts)
      .columns(["id"])
      .embed(Table::Likes, ["count"])
      .eq("id", 12)
      .limit(1);

    assert_eq!(select_pairs(&query), [
      pair("select", "id,likes(count)"),
      pair("id", "eq.12"),
      pair("limit", "1"),
    ]);
  }

  #[test]
  fn string_filters_are_unquoted_and_null_uses_is() {
    let filters = [
      Filter::eq("object_id", "A-1"),
      Filter::eq("caption", Value::Null),
    ];
    assert_eq!(filter_pairs(&filters), [
      pair("object_id", "eq.A-1"),
      pair("caption", "is.null"),
    ]);
  }

  #[test]
  fn empty_column_list_selects_everything() {
    assert_eq!(select_list(&[]), "*");
    assert_eq!(
      order_param(Order { column: "name", ascending: false }),
      "name.desc"
    );
  }
}
