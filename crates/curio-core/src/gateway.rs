//! [`ArtifactGateway`]: the single point of translation between the remote
//! artifact tables and the view-models.
//!
//! Every operation issues exactly one remote call. Read paths validate the
//! whole response before mapping it; write paths hand back whatever the
//! store returned.

use serde_json::{Value, json};
use tracing::debug;

use crate::{
  Error, Result,
  artifact::{
    Artifact, ArtifactId, ArtifactPayload, ArtifactSummary, NewArImage,
    NewImage,
  },
  client::{Filter, RemoteTableClient, Select, Table},
  context::{AccessToken, RequestContext},
  row::{self, DetailRow, SummaryRow},
  shape,
};

/// Remote procedure that records one like.
pub const LIKE_PROCEDURE: &str = "like_artifact";

/// Column the AR image table is unique on.
pub const AR_IMAGE_CONFLICT_KEY: &str = "artifact_id";

// ─── Gateway ────────────────────────────────────────────────────────────────

/// Request-scoped artifact data access.
///
/// Holds no state beyond its context; build one per request.
pub struct ArtifactGateway<C> {
  ctx: RequestContext<C>,
}

impl<C: RemoteTableClient> ArtifactGateway<C> {
  pub fn new(ctx: RequestContext<C>) -> Self { Self { ctx } }

  pub fn context(&self) -> &RequestContext<C> { &self.ctx }

  fn client(&self) -> &C { self.ctx.client() }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All artifacts, ordered by name ascending as the store sorts them.
  pub async fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>> {
    let query = Select::table(Table::Artifacts)
      .columns(["id", "name", "object_id"])
      .embed(Table::ArtifactImages, ["id", "caption", "url"])
      .order("name", true);

    debug!(request_id = %self.ctx.request_id(), "listing artifacts");
    let rows = self
      .client()
      .select(&query, None)
      .await
      .map_err(remote::<C>)?;

    let rows: Vec<SummaryRow> =
      shape::decode(&row::SUMMARY_LIST, Value::Array(rows))?;
    Ok(rows.into_iter().map(ArtifactSummary::from).collect())
  }

  /// The full record for `id`.
  ///
  /// Fails with [`Error::NotFound`] when no row has that id.
  pub async fn get_artifact(&self, id: ArtifactId) -> Result<Artifact> {
    let query = Select::table(Table::Artifacts)
      .columns(["id", "name", "date", "description", "dimensions", "object_id"])
      .embed(Table::ArtifactImages, ["id", "caption", "url"])
      .embed(Table::ArtifactArImages, ["id", "url"])
      .embed(Table::Likes, ["count"])
      .eq("id", id)
      .limit(1);

    debug!(request_id = %self.ctx.request_id(), id, "fetching artifact");
    let raw = self
      .client()
      .select_one(&query, None)
      .await
      .map_err(remote::<C>)?
      .ok_or(Error::NotFound(id))?;

    let detail: DetailRow = shape::decode(&row::DETAIL, raw)?;
    Ok(Artifact::from(detail))
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Record one like through the store's procedure. The result is returned
  /// untouched; duplicate likes are the procedure's concern.
  pub async fn like_artifact(&self, id: ArtifactId) -> Result<Value> {
    debug!(request_id = %self.ctx.request_id(), id, "liking artifact");
    self
      .client()
      .call(LIKE_PROCEDURE, json!({ "artifact_id_to_check": id }), None)
      .await
      .map_err(remote::<C>)
  }

  /// Insert a new artifact and return its id.
  pub async fn create_artifact(
    &self,
    payload: &ArtifactPayload,
    token: &AccessToken,
  ) -> Result<ArtifactId> {
    debug!(
      request_id = %self.ctx.request_id(),
      object_id = %payload.object_id,
      "creating artifact"
    );
    let inserted = self
      .client()
      .insert(Table::Artifacts, row::artifact_values(payload), Some(token))
      .await
      .map_err(remote::<C>)?;
    Ok(inserted.id)
  }

  pub async fn update_artifact(
    &self,
    id: ArtifactId,
    payload: &ArtifactPayload,
    token: &AccessToken,
  ) -> Result<Value> {
    debug!(request_id = %self.ctx.request_id(), id, "updating artifact");
    let filters = [Filter::eq("id", id)];
    self
      .client()
      .update(
        Table::Artifacts,
        row::artifact_values(payload),
        &filters,
        Some(token),
      )
      .await
      .map_err(remote::<C>)
  }

  pub async fn delete_artifact(
    &self,
    id: ArtifactId,
    token: &AccessToken,
  ) -> Result<Value> {
    debug!(request_id = %self.ctx.request_id(), id, "deleting artifact");
    let filters = [Filter::eq("id", id)];
    self
      .client()
      .delete(Table::Artifacts, &filters, Some(token))
      .await
      .map_err(remote::<C>)
  }

  /// Attach a captioned image; returns the image row's id.
  pub async fn add_image_to_artifact(
    &self,
    image: &NewImage,
    token: &AccessToken,
  ) -> Result<i64> {
    debug!(
      request_id = %self.ctx.request_id(),
      artifact_id = image.artifact_id,
      "adding image"
    );
    let inserted = self
      .client()
      .insert(Table::ArtifactImages, row::image_values(image), Some(token))
      .await
      .map_err(remote::<C>)?;
    Ok(inserted.id)
  }

  /// Set the artifact's AR image, replacing the URL of an existing one.
  pub async fn add_ar_image_to_artifact(
    &self,
    image: &NewArImage,
    token: &AccessToken,
  ) -> Result<Value> {
    debug!(
      request_id = %self.ctx.request_id(),
      artifact_id = image.artifact_id,
      "setting AR image"
    );
    self
      .client()
      .upsert(
        Table::ArtifactArImages,
        row::ar_image_values(image),
        AR_IMAGE_CONFLICT_KEY,
        Some(token),
      )
      .await
      .map_err(remote::<C>)
  }
}

fn remote<C: RemoteTableClient>(e: C::Error) -> Error {
  Error::Remote(Box::new(e))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
