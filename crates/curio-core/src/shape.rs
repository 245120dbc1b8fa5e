//! Response-shape descriptions and the validator that enforces them.
//!
//! Rows returned by the remote store are untyped JSON. Before any of it is
//! mapped into a view-model it is walked against a [`Shape`]; the first
//! violation aborts the whole read, so callers never see a partially-checked
//! record.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ─── Shape description ──────────────────────────────────────────────────────

/// Whether a record field has to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
  Required,
  Optional,
}

/// One named field of a [`Shape::Record`].
#[derive(Debug, Clone)]
pub struct Field {
  pub name:     &'static str,
  pub shape:    Shape,
  pub presence: Presence,
}

impl Field {
  pub fn required(name: &'static str, shape: Shape) -> Self {
    Self { name, shape, presence: Presence::Required }
  }

  /// An optional field may be absent. If present it must match `shape`;
  /// wrap the shape in [`Shape::Nullable`] to also accept `null`.
  pub fn optional(name: &'static str, shape: Shape) -> Self {
    Self { name, shape, presence: Presence::Optional }
  }
}

/// Structural description of a JSON value.
#[derive(Debug, Clone)]
pub enum Shape {
  /// A JSON number with no fractional part.
  Integer,
  /// A non-negative integer, e.g. an aggregate count.
  Count,
  /// A non-empty string.
  Text,
  /// An array whose every element matches the inner shape.
  List(Box<Shape>),
  /// An object with the given fields. Unlisted keys are ignored.
  Record(Vec<Field>),
  /// The inner shape, or `null`.
  Nullable(Box<Shape>),
}

impl Shape {
  pub fn list(item: Shape) -> Self { Self::List(Box::new(item)) }

  pub fn nullable(inner: Shape) -> Self { Self::Nullable(Box::new(inner)) }

  pub fn record(fields: impl IntoIterator<Item = Field>) -> Self {
    Self::Record(fields.into_iter().collect())
  }

  fn expected(&self) -> Kind {
    match self {
      Self::Integer | Self::Count => Kind::Integer,
      Self::Text => Kind::String,
      Self::List(_) => Kind::Array,
      Self::Record(_) => Kind::Object,
      Self::Nullable(inner) => inner.expected(),
    }
  }
}

// ─── Failures ───────────────────────────────────────────────────────────────

/// Coarse JSON type, used when reporting a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
  Null,
  Boolean,
  Integer,
  Number,
  String,
  Array,
  Object,
}

impl Kind {
  pub fn of(value: &Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::Bool(_) => Self::Boolean,
      Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
      Value::Number(_) => Self::Number,
      Value::String(_) => Self::String,
      Value::Array(_) => Self::Array,
      Value::Object(_) => Self::Object,
    }
  }
}

/// What was wrong at the failing location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
  Missing,
  Null,
  WrongType { expected: Kind, found: Kind },
  Empty,
  Negative,
  /// The value matched its shape but could not be deserialised into the
  /// target row type.
  Decode(String),
}

impl fmt::Display for Problem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Missing => f.write_str("required field is missing"),
      Self::Null => f.write_str("value cannot be null"),
      Self::WrongType { expected, found } => {
        write!(f, "expected {expected}, found {found}")
      }
      Self::Empty => f.write_str("text cannot be empty"),
      Self::Negative => f.write_str("count cannot be negative"),
      Self::Decode(msg) => write!(f, "cannot decode: {msg}"),
    }
  }
}

/// A value did not match its [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {problem}")]
pub struct ShapeError {
  /// Location of the offending value, e.g. `$[1].artifact_images[0].url`.
  pub path:    String,
  pub problem: Problem,
}

enum Segment {
  Key(&'static str),
  Index(usize),
}

fn render(path: &[Segment]) -> String {
  let mut out = String::from("$");
  for segment in path {
    match segment {
      Segment::Key(key) => {
        out.push('.');
        out.push_str(key);
      }
      Segment::Index(i) => out.push_str(&format!("[{i}]")),
    }
  }
  out
}

fn fail(path: &[Segment], problem: Problem) -> ShapeError {
  ShapeError { path: render(path), problem }
}

// ─── Validation ─────────────────────────────────────────────────────────────

/// Check `value` against `shape`, reporting the first violation found in
/// document order.
pub fn validate(shape: &Shape, value: &Value) -> Result<(), ShapeError> {
  check(shape, value, &mut Vec::new())
}

/// Validate `value` and, only if it matches, deserialise it into `T`.
pub fn decode<T: DeserializeOwned>(
  shape: &Shape,
  value: Value,
) -> Result<T, ShapeError> {
  validate(shape, &value)?;
  serde_json::from_value(value).map_err(|e| ShapeError {
    path:    "$".to_owned(),
    problem: Problem::Decode(e.to_string()),
  })
}

fn check(
  shape: &Shape,
  value: &Value,
  path: &mut Vec<Segment>,
) -> Result<(), ShapeError> {
  match (shape, value) {
    (Shape::Nullable(_), Value::Null) => Ok(()),
    (Shape::Nullable(inner), _) => check(inner, value, path),
    (_, Value::Null) => Err(fail(path, Problem::Null)),

    (Shape::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
    (Shape::Count, Value::Number(n)) if n.is_u64() => Ok(()),
    (Shape::Count, Value::Number(n)) if n.is_i64() => {
      Err(fail(path, Problem::Negative))
    }

    (Shape::Text, Value::String(s)) if s.is_empty() => {
      Err(fail(path, Problem::Empty))
    }
    (Shape::Text, Value::String(_)) => Ok(()),

    (Shape::List(item), Value::Array(items)) => {
      for (i, element) in items.iter().enumerate() {
        path.push(Segment::Index(i));
        check(item, element, path)?;
        path.pop();
      }
      Ok(())
    }

    (Shape::Record(fields), Value::Object(map)) => {
      for field in fields {
        path.push(Segment::Key(field.name));
        match map.get(field.name) {
          Some(v) => check(&field.shape, v, path)?,
          None if field.presence == Presence::Required => {
            return Err(fail(path, Problem::Missing));
          }
          None => {}
        }
        path.pop();
      }
      Ok(())
    }

    (shape, found) => Err(fail(path, Problem::WrongType {
      expected: shape.expected(),
      found:    Kind::of(found),
    })),
  }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn image() -> Shape {
    Shape::record([
      Field::required("id", Shape::Integer),
      Field::required("caption", Shape::Text),
      Field::required("url", Shape::Text),
    ])
  }

  #[test]
  fn accepts_matching_record_with_extra_keys() {
    let value = json!({ "id": 1, "caption": "Front", "url": "a.jpg", "x": true });
    assert_eq!(validate(&image(), &value), Ok(()));
  }

  #[test]
  fn reports_path_of_missing_nested_field() {
    let shape = Shape::list(Shape::record([
      Field::required("name", Shape::Text),
      Field::optional("artifact_images", Shape::list(image())),
    ]));
    let value = json!([
      { "name": "Amphora" },
      { "name": "Coin", "artifact_images": [{ "id": 3, "url": "c.jpg" }] },
    ]);

    let err = validate(&shape, &value).unwrap_err();
    assert_eq!(err.path, "$[1].artifact_images[0].caption");
    assert_eq!(err.problem, Problem::Missing);
  }

  #[test]
  fn empty_text_is_rejected() {
    let err = validate(&Shape::Text, &json!("")).unwrap_err();
    assert_eq!(err.problem, Problem::Empty);
  }

  #[test]
  fn fractional_number_is_not_an_integer() {
    let err = validate(&Shape::Integer, &json!(1.5)).unwrap_err();
    assert_eq!(err.problem, Problem::WrongType {
      expected: Kind::Integer,
      found:    Kind::Number,
    });
  }

  #[test]
  fn negative_count_is_rejected() {
    let err = validate(&Shape::Count, &json!(-2)).unwrap_err();
    assert_eq!(err.problem, Problem::Negative);
    assert_eq!(validate(&Shape::Count, &json!(0)), Ok(()));
  }

  #[test]
  fn null_only_accepted_when_nullable() {
    assert_eq!(validate(&Shape::nullable(image()), &json!(null)), Ok(()));

    let err = validate(&image(), &json!(null)).unwrap_err();
    assert_eq!(err.path, "$");
    assert_eq!(err.problem, Problem::Null);
  }

  #[test]
  fn optional_field_present_as_null_still_fails() {
    let shape = Shape::record([Field::optional("count", Shape::Count)]);
    assert_eq!(validate(&shape, &json!({})), Ok(()));

    let err = validate(&shape, &json!({ "count": null })).unwrap_err();
    assert_eq!(err.path, "$.count");
    assert_eq!(err.problem, Problem::Null);
  }

  #[test]
  fn error_message_names_path_and_problem() {
    let shape = Shape::record([Field::required("id", Shape::Integer)]);
    let err = validate(&shape, &json!({ "id": "7" })).unwrap_err();
    assert_eq!(err.to_string(), "$.id: expected integer, found string");
  }

  #[test]
  fn decode_yields_typed_value() {
    #[derive(serde::Deserialize)]
    struct Image {
      id:  i64,
      url: String,
    }

    let image: Image =
      decode(&image(), json!({ "id": 9, "caption": "Side", "url": "s.jpg" }))
        .unwrap();
    assert_eq!(image.id, 9);
    assert_eq!(image.url, "s.jpg");
  }
}
