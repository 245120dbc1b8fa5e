//! Wiring for the `curio-server` binary: configuration, backend selection and
//! the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use curio_core::client::RemoteTableClient;
use curio_rest::{RestClient, RestConfig};
use curio_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

/// Runtime server configuration, deserialised from `curio.toml` and
/// `CURIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:    String,
  #[serde(default = "default_port")]
  pub port:    u16,
  pub backend: BackendConfig,
}

/// Which [`RemoteTableClient`] serves the catalogue.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
  /// Local SQLite emulation. `:memory:` keeps everything in process.
  Sqlite {
    path:   PathBuf,
    #[serde(default)]
    tokens: Vec<String>,
  },
  /// The hosted store over HTTP.
  Rest(RestConfig),
}

/// `CURIO_*` environment variables. Nested keys use a double underscore
/// after the prefix, e.g. `CURIO_BACKEND__KIND=sqlite`.
pub fn environment() -> config::Environment {
  config::Environment::with_prefix("CURIO")
    .prefix_separator("_")
    .separator("__")
}

/// Merge the optional TOML file at `path` with the process environment.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  load_config_with(path, environment())
}

/// As [`load_config`], reading variables from `env`. Later sources win.
pub fn load_config_with(
  path: &Path,
  env: config::Environment,
) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn router<C>(client: Arc<C>) -> Router
where
  C: RemoteTableClient + 'static,
{
  Router::new()
    .nest("/api", curio_api::api_router(client))
    .layer(TraceLayer::new_for_http())
}

/// Build the configured backend and the router around it.
pub async fn app(backend: &BackendConfig) -> anyhow::Result<Router> {
  match backend {
    BackendConfig::Sqlite { path, tokens } => {
      let store = open_sqlite(path).await?.with_tokens(tokens.iter().cloned());
      info!(?path, restricted = !tokens.is_empty(), "using sqlite backend");
      Ok(router(Arc::new(store)))
    }
    BackendConfig::Rest(config) => {
      let client = RestClient::new(config.clone())
        .context("failed to build HTTP client")?;
      info!(url = %config.url, "using remote backend");
      Ok(router(Arc::new(client)))
    }
  }
}

/// Open the store at `path`, creating missing parent directories.
async fn open_sqlite(path: &Path) -> anyhow::Result<SqliteStore> {
  if path.as_os_str() == ":memory:" {
    return SqliteStore::open_in_memory()
      .await
      .context("failed to open in-memory store");
  }

  let path = expand_tilde(path);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
