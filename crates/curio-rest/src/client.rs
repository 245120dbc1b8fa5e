//! Async HTTP client for the hosted table store.

use std::time::Duration;

use curio_core::{
  client::{Filter, Inserted, RemoteTableClient, Select, Table},
  context::AccessToken,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
  error::{RestError, Result},
  query,
};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

fn default_timeout() -> u64 { 30 }

/// Connection settings for the hosted store.
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
  /// Project base URL, e.g. `https://xyz.example.co`.
  pub url:          String,
  /// Public anonymous key. Sent as `apikey` on every request, and as the
  /// bearer credential when the caller has none.
  pub anon_key:     String,
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

/// [`RemoteTableClient`] over HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RestClient {
  client: Client,
  config: RestConfig,
}

impl RestClient {
  pub fn new(config: RestConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/rest/v1/{}",
      self.config.url.trim_end_matches('/'),
      path
    )
  }

  fn request(
    &self,
    method: Method,
    path: &str,
    credential: Option<&AccessToken>,
  ) -> RequestBuilder {
    let bearer = credential
      .filter(|t| !t.is_blank())
      .map_or(self.config.anon_key.as_str(), AccessToken::as_str);
    debug!(%method, path, authenticated = credential.is_some(), "store request");
    self
      .client
      .request(method, self.url(path))
      .header("apikey", &self.config.anon_key)
      .bearer_auth(bearer)
  }

  fn read(
    &self,
    query: &Select,
    credential: Option<&AccessToken>,
  ) -> RequestBuilder {
    self
      .request(Method::GET, query.table.name(), credential)
      .query(&query::select_pairs(query))
  }

  fn write(
    &self,
    method: Method,
    table: Table,
    filters: &[Filter],
    credential: Option<&AccessToken>,
  ) -> RequestBuilder {
    self
      .request(method, table.name(), credential)
      .query(&query::filter_pairs(filters))
      .header("Prefer", "return=representation")
  }

  fn rpc(
    &self,
    procedure: &str,
    args: &Value,
    credential: Option<&AccessToken>,
  ) -> RequestBuilder {
    self
      .request(Method::POST, &format!("rpc/{procedure}"), credential)
      .json(args)
  }
}

/// Fail on non-success statuses; an empty success body reads as null.
async fn body(resp: Response) -> Result<Value> {
  let status = resp.status();
  let bytes = resp.bytes().await?;
  if !status.is_success() {
    return Err(RestError::Status {
      status: status.as_u16(),
      body:   String::from_utf8_lossy(&bytes).into_owned(),
    });
  }
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Null);
  }
  Ok(serde_json::from_slice(&bytes)?)
}

impl RemoteTableClient for RestClient {
  type Error = RestError;

  async fn select(
    &self,
    query: &Select,
    credential: Option<&AccessToken>,
  ) -> Result<Vec<Value>> {
    let resp = self.read(query, credential).send().await?;
    match body(resp).await? {
      Value::Array(rows) => Ok(rows),
      _ => Err(RestError::UnexpectedBody("expected an array of rows")),
    }
  }

  async fn select_one(
    &self,
    query: &Select,
    credential: Option<&AccessToken>,
  ) -> Result<Option<Value>> {
    let resp = self
      .read(query, credential)
      .header(header::ACCEPT, SINGLE_OBJECT)
      .send()
      .await?;
    // The store answers a single-object read that matched nothing with 406.
    if resp.status() == StatusCode::NOT_ACCEPTABLE {
      return Ok(None);
    }
    body(resp).await.map(Some)
  }

  async fn insert(
    &self,
    table: Table,
    values: Value,
    credential: Option<&AccessToken>,
  ) -> Result<Inserted> {
    let resp = self
      .write(Method::POST, table, &[], credential)
      .query(&[("select", "id")])
      .header(header::ACCEPT, SINGLE_OBJECT)
      .json(&values)
      .send()
      .await?;
    Ok(serde_json::from_value(body(resp).await?)?)
  }

  async fn update(
    &self,
    table: Table,
    values: Value,
    filters: &[Filter],
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    let resp = self
      .write(Method::PATCH, table, filters, credential)
      .json(&values)
      .send()
      .await?;
    body(resp).await
  }

  async fn delete(
    &self,
    table: Table,
    filters: &[Filter],
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    let resp = self
      .write(Method::DELETE, table, filters, credential)
      .send()
      .await?;
    body(resp).await
  }

  async fn upsert(
    &self,
    table: Table,
    values: Value,
    conflict_key: &str,
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    let resp = self
      .request(Method::POST, table.name(), credential)
      .query(&[("on_conflict", conflict_key)])
      .header("Prefer", "resolution=merge-duplicates,return=representation")
      .json(&values)
      .send()
      .await?;
    body(resp).await
  }

  async fn call(
    &self,
    procedure: &str,
    args: Value,
    credential: Option<&AccessToken>,
  ) -> Result<Value> {
    let resp = self.rpc(procedure, &args, credential).send().await?;
    body(resp).await
  }
}

#[cfg(test)]
mod tests {
  use axum::Router;
  use serde_json::json;
  use tokio::net::TcpListener;

  use super::*;

  fn client() -> RestClient {
    RestClient::new(RestConfig {
      url:          "https://store.example/".into(),
      anon_key:     "anon".into(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  fn header<'a>(req: &'a reqwest::Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
  }

  #[test]
  fn reads_fall_back_to_the_anonymous_key() {
    let query = Select::table(Table::Artifacts)
      .columns(["id", "name"])
      .order("name", true);
    let req = client().read(&query, None).build().unwrap();

    assert_eq!(req.url().path(), "/rest/v1/artifacts");
    assert_eq!(header(&req, "apikey"), Some("anon"));
    assert_eq!(header(&req, "authorization"), Some("Bearer anon"));

    let pairs: Vec<(String, String)> = req
      .url()
      .query_pairs()
      .map(|(k, v)| (k.into_owned(), v.into_owned()))
      .collect();
    assert_eq!(pairs, [
      ("select".to_owned(), "id,name".to_owned()),
      ("order".to_owned(), "name.asc".to_owned()),
    ]);
  }

  #[test]
  fn writes_carry_the_caller_token_and_filters() {
    let token = AccessToken::new("user-jwt");
    let filters = [Filter::eq("id", 9)];
    let req = client()
      .write(Method::DELETE, Table::Artifacts, &filters, Some(&token))
      .build()
      .unwrap();

    assert_eq!(req.method(), Method::DELETE);
    assert_eq!(header(&req, "authorization"), Some("Bearer user-jwt"));
    assert_eq!(header(&req, "prefer"), Some("return=representation"));
    assert_eq!(req.url().query(), Some("id=eq.9"));
  }

  #[test]
  fn blank_token_is_sent_as_anonymous() {
    let token = AccessToken::new("   ");
    let req = client()
      .request(Method::GET, "likes", Some(&token))
      .build()
      .unwrap();
    assert_eq!(header(&req, "authorization"), Some("Bearer anon"));
  }

  #[test]
  fn procedures_post_json_arguments() {
    let args = json!({ "artifact_id_to_check": 4 });
    let req = client().rpc("like_artifact", &args, None).build().unwrap();

    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.url().as_str(), "https://store.example/rest/v1/rpc/like_artifact");
    let sent: Value = req
      .body()
      .and_then(|b| b.as_bytes())
      .map(|b| serde_json::from_slice(b).unwrap())
      .unwrap();
    assert_eq!(sent, args);
  }

  // ── Response handling ───────────────────────────────────────────────────────

  /// A local store that answers every request with `status` and `body`.
  async fn canned(status: u16, body: &'static str) -> RestClient {
    let status = axum::http::StatusCode::from_u16(status).unwrap();
    let app = Router::new().fallback(move || async move { (status, body) });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    RestClient::new(RestConfig {
      url:          format!("http://{addr}"),
      anon_key:     "anon".into(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  fn by_id(id: i64) -> Select {
    Select::table(Table::Artifacts).columns(["id"]).eq("id", id).limit(1)
  }

  #[tokio::test]
  async fn not_acceptable_single_read_is_no_row() {
    let client = canned(406, r#"{"code":"PGRST116"}"#).await;
    assert_eq!(client.select_one(&by_id(1), None).await.unwrap(), None);
  }

  #[tokio::test]
  async fn single_read_returns_the_object() {
    let client = canned(200, r#"{"id":1,"name":"Amphora"}"#).await;
    let row = client.select_one(&by_id(1), None).await.unwrap();
    assert_eq!(row, Some(json!({ "id": 1, "name": "Amphora" })));
  }

  #[tokio::test]
  async fn error_status_keeps_body_verbatim() {
    let client = canned(500, "permission denied for table artifacts").await;
    let err = client
      .select(&Select::table(Table::Artifacts), None)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      RestError::Status { status: 500, ref body }
        if body == "permission denied for table artifacts"
    ));
  }

  #[tokio::test]
  async fn empty_success_body_is_null() {
    let client = canned(204, "").await;
    let token = AccessToken::new("user-jwt");
    let filters = [Filter::eq("id", 3)];
    let data = client
      .delete(Table::Artifacts, &filters, Some(&token))
      .await
      .unwrap();
    assert_eq!(data, Value::Null);
  }

  #[tokio::test]
  async fn list_read_rejects_non_array_body() {
    let client = canned(200, r#"{"id":1}"#).await;
    let err = client
      .select(&Select::table(Table::Artifacts), None)
      .await
      .unwrap_err();
    assert!(matches!(err, RestError::UnexpectedBody(_)));
  }

  #[tokio::test]
  async fn insert_reads_back_the_new_id() {
    let client = canned(201, r#"{"id":42}"#).await;
    let token = AccessToken::new("user-jwt");
    let inserted = client
      .insert(Table::Artifacts, json!({ "name": "Amphora" }), Some(&token))
      .await
      .unwrap();
    assert_eq!(inserted, Inserted { id: 42 });
  }
}
