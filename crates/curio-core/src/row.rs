//! The remote row representation of artifacts and its mapping to and from the
//! view-models in [`crate::artifact`].
//!
//! Rows use the store's snake_case column names and nest joined tables under
//! the child table's name. Every row type here is only ever produced by
//! [`crate::shape::decode`] against the matching shape below.

use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  artifact::{
    ArImage, Artifact, ArtifactId, ArtifactImage, ArtifactPayload,
    ArtifactSummary, NewArImage, NewImage,
  },
  shape::{Field, Shape},
};

// ─── Wire rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImageRow {
  pub id:      i64,
  pub caption: String,
  pub url:     String,
}

#[derive(Debug, Deserialize)]
pub struct ArImageRow {
  pub id:  i64,
  pub url: String,
}

/// The `likes(count)` aggregate.
#[derive(Debug, Deserialize)]
pub struct LikesRow {
  #[serde(default)]
  pub count: Option<u64>,
}

/// A row of the listing query.
#[derive(Debug, Deserialize)]
pub struct SummaryRow {
  pub id:              ArtifactId,
  pub name:            String,
  pub object_id:       String,
  #[serde(default)]
  pub artifact_images: Vec<ImageRow>,
}

/// A row of the single-artifact query.
#[derive(Debug, Deserialize)]
pub struct DetailRow {
  pub id:                 ArtifactId,
  pub name:               String,
  pub date:               String,
  pub description:        String,
  pub dimensions:         String,
  pub object_id:          String,
  pub artifact_images:    Vec<ImageRow>,
  #[serde(default)]
  pub artifact_ar_images: Option<ArImageRow>,
  #[serde(default)]
  pub likes:              Option<LikesRow>,
}

// ─── Shapes ─────────────────────────────────────────────────────────────────

fn image_shape() -> Shape {
  Shape::record([
    Field::required("id", Shape::Integer),
    Field::required("caption", Shape::Text),
    Field::required("url", Shape::Text),
  ])
}

/// Shape of the listing response: an array of [`SummaryRow`].
pub static SUMMARY_LIST: LazyLock<Shape> = LazyLock::new(|| {
  Shape::list(Shape::record([
    Field::required("id", Shape::Integer),
    Field::required("name", Shape::Text),
    Field::required("object_id", Shape::Text),
    Field::optional("artifact_images", Shape::list(image_shape())),
  ]))
});

/// Shape of a single [`DetailRow`].
pub static DETAIL: LazyLock<Shape> = LazyLock::new(|| {
  Shape::record([
    Field::required("id", Shape::Integer),
    Field::required("name", Shape::Text),
    Field::required("date", Shape::Text),
    Field::required("description", Shape::Text),
    Field::required("dimensions", Shape::Text),
    Field::required("object_id", Shape::Text),
    Field::required("artifact_images", Shape::list(image_shape())),
    Field::optional(
      "artifact_ar_images",
      Shape::nullable(Shape::record([
        Field::required("id", Shape::Integer),
        Field::required("url", Shape::Text),
      ])),
    ),
    Field::optional(
      "likes",
      Shape::nullable(Shape::record([Field::optional("count", Shape::Count)])),
    ),
  ])
});

// ─── Mapping ────────────────────────────────────────────────────────────────

impl From<ImageRow> for ArtifactImage {
  fn from(row: ImageRow) -> Self {
    Self { id: row.id, caption: row.caption, url: row.url }
  }
}

impl From<ArImageRow> for ArImage {
  fn from(row: ArImageRow) -> Self { Self { id: row.id, url: row.url } }
}

impl From<SummaryRow> for ArtifactSummary {
  fn from(row: SummaryRow) -> Self {
    Self {
      id:        row.id,
      name:      row.name,
      object_id: row.object_id,
      image:     row.artifact_images.into_iter().next().map(Into::into),
    }
  }
}

impl From<DetailRow> for Artifact {
  fn from(row: DetailRow) -> Self {
    Self {
      id:          row.id,
      name:        row.name,
      object_id:   row.object_id,
      date:        row.date,
      description: row.description,
      dimensions:  row.dimensions,
      images:      row.artifact_images.into_iter().map(Into::into).collect(),
      ar_image:    row.artifact_ar_images.map(Into::into),
      like_count:  row.likes.and_then(|l| l.count).unwrap_or(0),
    }
  }
}

/// Column values for inserting or updating an `artifacts` row.
pub fn artifact_values(payload: &ArtifactPayload) -> Value {
  json!({
    "name":        payload.name,
    "object_id":   payload.object_id,
    "date":        payload.date,
    "dimensions":  payload.dimensions,
    "description": payload.description,
  })
}

pub fn image_values(image: &NewImage) -> Value {
  json!({
    "artifact_id": image.artifact_id,
    "caption":     image.caption,
    "url":         image.url,
  })
}

pub fn ar_image_values(image: &NewArImage) -> Value {
  json!({ "artifact_id": image.artifact_id, "url": image.url })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
