//! Handlers for `/artifacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/artifacts` | Sorted by name |
//! | `POST`   | `/artifacts` | Bearer; body: [`ArtifactPayload`]; 201 `{"id"}` |
//! | `GET`    | `/artifacts/{id}` | 404 if not found |
//!
//! Non-integer ids are 400 and blank text fields are 422, both with the usual
//! `{"error"}` body.
//! | `PUT`    | `/artifacts/{id}` | Bearer; body: [`ArtifactPayload`] |
//! | `DELETE` | `/artifacts/{id}` | Bearer; 204 |
//! | `POST`   | `/artifacts/{id}/like` | `{"data": <procedure result>}` |
//! | `POST`   | `/artifacts/{id}/images` | Bearer; body: `{"caption","url"}`; 201 `{"id"}` |
//! | `PUT`    | `/artifacts/{id}/ar-image` | Bearer; body: `{"url"}` |

use axum::{
  Json,
  extract::{FromRequestParts, Path, State},
  http::{StatusCode, request::Parts},
  response::IntoResponse,
};
use curio_core::{
  artifact::{
    Artifact, ArtifactId, ArtifactPayload, ArtifactSummary, NewArImage,
    NewImage,
  },
  client::RemoteTableClient,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, auth::BearerToken, error::ApiError};

// ─── Extraction and validation ────────────────────────────────────────────────

/// The `{id}` path segment. A non-integer id is a JSON 400.
pub struct ArtifactPath(pub ArtifactId);

impl<S> FromRequestParts<S> for ArtifactPath
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    Path::<ArtifactId>::from_request_parts(parts, state)
      .await
      .map(|Path(id)| ArtifactPath(id))
      .map_err(|e| ApiError::BadRequest(e.body_text()))
  }
}

/// First blank field wins; names are the JSON keys the caller sent.
fn require_text(fields: &[(&'static str, &str)]) -> Result<(), ApiError> {
  match fields.iter().find(|(_, value)| value.is_empty()) {
    Some((name, _)) => Err(ApiError::EmptyField(*name)),
    None => Ok(()),
  }
}

fn validate_payload(body: &ArtifactPayload) -> Result<(), ApiError> {
  require_text(&[
    ("name", body.name.as_str()),
    ("objectId", body.object_id.as_str()),
    ("date", body.date.as_str()),
    ("dimensions", body.dimensions.as_str()),
    ("description", body.description.as_str()),
  ])
}

// ─── Artifacts ────────────────────────────────────────────────────────────────

/// `GET /artifacts`
pub async fn list<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
) -> Result<Json<Vec<ArtifactSummary>>, ApiError> {
  Ok(Json(state.gateway().list_artifacts().await?))
}

/// `POST /artifacts`
pub async fn create<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  BearerToken(token): BearerToken,
  Json(body): Json<ArtifactPayload>,
) -> Result<impl IntoResponse, ApiError> {
  validate_payload(&body)?;
  let id = state.gateway().create_artifact(&body, &token).await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `GET /artifacts/{id}`
pub async fn get_one<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
) -> Result<Json<Artifact>, ApiError> {
  Ok(Json(state.gateway().get_artifact(id).await?))
}

/// `PUT /artifacts/{id}`
pub async fn update<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
  BearerToken(token): BearerToken,
  Json(body): Json<ArtifactPayload>,
) -> Result<Json<Value>, ApiError> {
  validate_payload(&body)?;
  Ok(Json(state.gateway().update_artifact(id, &body, &token).await?))
}

/// `DELETE /artifacts/{id}`
pub async fn delete<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
  BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
  state.gateway().delete_artifact(id, &token).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Likes ────────────────────────────────────────────────────────────────────

/// `POST /artifacts/{id}/like`
pub async fn like<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
) -> Result<Json<Value>, ApiError> {
  let data = state.gateway().like_artifact(id).await?;
  Ok(Json(json!({ "data": data })))
}

// ─── Images ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImageBody {
  pub caption: String,
  pub url:     String,
}

/// `POST /artifacts/{id}/images`
pub async fn add_image<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
  BearerToken(token): BearerToken,
  Json(body): Json<ImageBody>,
) -> Result<impl IntoResponse, ApiError> {
  require_text(&[
    ("caption", body.caption.as_str()),
    ("url", body.url.as_str()),
  ])?;
  let image = NewImage { artifact_id: id, caption: body.caption, url: body.url };
  let id = state.gateway().add_image_to_artifact(&image, &token).await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Debug, Deserialize)]
pub struct ArImageBody {
  pub url: String,
}

/// `PUT /artifacts/{id}/ar-image`
pub async fn set_ar_image<C: RemoteTableClient>(
  State(state): State<AppState<C>>,
  ArtifactPath(id): ArtifactPath,
  BearerToken(token): BearerToken,
  Json(body): Json<ArImageBody>,
) -> Result<Json<Value>, ApiError> {
  require_text(&[("url", body.url.as_str())])?;
  let image = NewArImage { artifact_id: id, url: body.url };
  Ok(Json(state.gateway().add_ar_image_to_artifact(&image, &token).await?))
}
