//! JSON REST API for the artifact catalogue.
//!
//! Exposes an axum [`Router`] backed by any
//! [`curio_core::client::RemoteTableClient`]. Each request gets its own
//! [`ArtifactGateway`] with a fresh request id; the client handle is shared.
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", curio_api::api_router(client.clone()))
//! ```

pub mod artifacts;
pub mod auth;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use curio_core::{
  ArtifactGateway, client::RemoteTableClient, context::RequestContext,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<C> {
  pub client: Arc<C>,
}

impl<C> Clone for AppState<C> {
  fn clone(&self) -> Self { Self { client: Arc::clone(&self.client) } }
}

impl<C: RemoteTableClient> AppState<C> {
  /// A gateway scoped to the current request.
  pub fn gateway(&self) -> ArtifactGateway<C> {
    ArtifactGateway::new(RequestContext::new(Arc::clone(&self.client)))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `client`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C>(client: Arc<C>) -> Router<()>
where
  C: RemoteTableClient + 'static,
{
  Router::new()
    .route(
      "/artifacts",
      get(artifacts::list::<C>).post(artifacts::create::<C>),
    )
    .route(
      "/artifacts/{id}",
      get(artifacts::get_one::<C>)
        .put(artifacts::update::<C>)
        .delete(artifacts::delete::<C>),
    )
    .route("/artifacts/{id}/like", post(artifacts::like::<C>))
    .route("/artifacts/{id}/images", post(artifacts::add_image::<C>))
    .route("/artifacts/{id}/ar-image", put(artifacts::set_ar_image::<C>))
    .with_state(AppState { client })
}

// ─── Integration tests ────────────────────────────────────────────────────────
