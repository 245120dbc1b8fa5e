//! Bearer-token extractor for write routes.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use curio_core::context::AccessToken;

use crate::error::ApiError;

/// The caller's credential, forwarded untouched to the remote store.
///
/// Extraction fails with 401 when the `Authorization` header is absent, is
/// not a bearer credential, or carries a blank token. Whether the token is
/// actually allowed to write is for the store to decide.
#[derive(Debug, Clone)]
pub struct BearerToken(pub AccessToken);

pub fn bearer_token(headers: &HeaderMap) -> Result<AccessToken, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let token = value
    .strip_prefix("Bearer ")
    .map(AccessToken::new)
    .ok_or(ApiError::Unauthorized)?;

  if token.is_blank() {
    return Err(ApiError::Unauthorized);
  }
  Ok(token)
}

impl<S> FromRequestParts<S> for BearerToken
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    bearer_token(&parts.headers).map(BearerToken)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &'static str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
    map
  }

  #[test]
  fn accepts_bearer_token() {
    let token = bearer_token(&headers("Bearer abc.def")).unwrap();
    assert_eq!(token.as_str(), "abc.def");
  }

  #[test]
  fn rejects_missing_other_scheme_and_blank() {
    assert!(bearer_token(&HeaderMap::new()).is_err());
    assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
    assert!(bearer_token(&headers("Bearer    ")).is_err());
  }
}
