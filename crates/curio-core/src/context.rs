//! Request-scoped context handed to the gateway, and the access credential
//! passed alongside authenticated calls.

use std::{fmt, sync::Arc};

use uuid::Uuid;

// ─── Credentials ────────────────────────────────────────────────────────────

/// A bearer credential for the remote store's row-level policy.
///
/// The gateway never inspects it; it is forwarded as-is to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// `true` for an empty or whitespace-only token.
  pub fn is_blank(&self) -> bool { self.0.trim().is_empty() }
}

impl fmt::Debug for AccessToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("AccessToken(..)")
  }
}

// ─── Context ────────────────────────────────────────────────────────────────

/// Everything one inbound request needs to reach the remote store.
///
/// Built per request and dropped with it. The client handle is shared; the
/// request id only correlates log lines.
pub struct RequestContext<C> {
  client:     Arc<C>,
  request_id: Uuid,
}

impl<C> RequestContext<C> {
  /// A context with a freshly generated request id.
  pub fn new(client: Arc<C>) -> Self {
    Self { client, request_id: Uuid::new_v4() }
  }

  pub fn with_request_id(client: Arc<C>, request_id: Uuid) -> Self {
    Self { client, request_id }
  }

  pub fn client(&self) -> &C { &self.client }

  pub fn request_id(&self) -> Uuid { self.request_id }
}

impl<C> Clone for RequestContext<C> {
  fn clone(&self) -> Self {
    Self { client: Arc::clone(&self.client), request_id: self.request_id }
  }
}
