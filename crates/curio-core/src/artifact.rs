//! Artifact view-models: the camelCase shapes the rest of the application
//! works with.
//!
//! These never touch the wire format directly; see [`crate::row`] for the
//! remote representation and the mapping between the two.

use serde::{Deserialize, Serialize};

// ─── Ids ────────────────────────────────────────────────────────────────────

/// Primary identifier of an artifact row; assigned by the remote store.
pub type ArtifactId = i64;

// ─── View-models ────────────────────────────────────────────────────────────

/// A captioned image attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactImage {
  pub id:      i64,
  pub caption: String,
  pub url:     String,
}

/// The single augmented-reality image an artifact may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArImage {
  pub id:  i64,
  pub url: String,
}

/// One row of the artifact listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
  pub id:        ArtifactId,
  pub name:      String,
  pub object_id: String,
  /// Thumbnail: the first image in the order the store returned them.
  pub image:     Option<ArtifactImage>,
}

/// The full detail view of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
  pub id:          ArtifactId,
  pub name:        String,
  pub object_id:   String,
  pub date:        String,
  pub description: String,
  pub dimensions:  String,
  pub images:      Vec<ArtifactImage>,
  pub ar_image:    Option<ArImage>,
  /// Zero when the store reports no likes aggregate.
  pub like_count:  u64,
}

// ─── Inputs ─────────────────────────────────────────────────────────────────

/// Editable catalogue fields, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPayload {
  pub name:        String,
  pub object_id:   String,
  pub date:        String,
  pub dimensions:  String,
  pub description: String,
}

/// A captioned image to attach to an existing artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
  pub artifact_id: ArtifactId,
  pub caption:     String,
  pub url:         String,
}

/// The AR image for an artifact. Replaces any existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArImage {
  pub artifact_id: ArtifactId,
  pub url:         String,
}
