//! Process wiring for the accolade HTTP server.
//!
//! [`ServerConfig`] is read from `config.toml` and `ACCOLADE_*` environment
//! variables. [`open_state`] opens both SQLite stores and seeds the default
//! roles; [`build_app`] wraps the API router with request tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use accolade_api::{AppState, token::TokenIssuer};
use accolade_store_sqlite::{SqliteDocumentStore, SqliteStore};
use anyhow::{Context as _, bail};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub type State = AppState<SqliteStore, SqliteDocumentStore>;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration. Only `jwt_secret` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_relational_store")]
  pub relational_store_path: PathBuf,
  #[serde(default = "default_document_store")]
  pub document_store_path:   PathBuf,
  #[serde(default = "default_uploads_dir")]
  pub uploads_dir:           PathBuf,
  /// HS256 signing secret, at least 32 bytes.
  pub jwt_secret:            String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours:       i64,
  /// How long a store call waits on a locked database.
  #[serde(default = "default_store_timeout_secs")]
  pub store_timeout_secs:    u64,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_relational_store() -> PathBuf { "accolade.db".into() }
fn default_document_store() -> PathBuf { "accolade-documents.db".into() }
fn default_uploads_dir() -> PathBuf { "uploads".into() }
fn default_token_ttl_hours() -> i64 { 24 }
fn default_store_timeout_secs() -> u64 { 5 }

impl ServerConfig {
  /// Layer `path` (optional) under `ACCOLADE_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ACCOLADE"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn token_ttl(&self) -> anyhow::Result<chrono::Duration> {
    if self.token_ttl_hours <= 0 {
      bail!("token_ttl_hours must be positive, got {}", self.token_ttl_hours);
    }
    chrono::Duration::try_hours(self.token_ttl_hours)
      .with_context(|| format!("token_ttl_hours {} is out of range", self.token_ttl_hours))
  }

  pub fn store_timeout(&self) -> Duration { Duration::from_secs(self.store_timeout_secs) }
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Open both stores, seed roles and permissions, and build the shared state.
pub async fn open_state(cfg: &ServerConfig) -> anyhow::Result<State> {
  let tokens = TokenIssuer::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl()?)
    .context("invalid jwt_secret")?;

  let relational_path = expand_tilde(&cfg.relational_store_path);
  let directory = SqliteStore::open(&relational_path, cfg.store_timeout())
    .await
    .with_context(|| format!("failed to open relational store at {relational_path:?}"))?;

  let document_path = expand_tilde(&cfg.document_store_path);
  let documents = SqliteDocumentStore::open(&document_path, cfg.store_timeout())
    .await
    .with_context(|| format!("failed to open document store at {document_path:?}"))?;

  let state = AppState::new(
    Arc::new(directory),
    Arc::new(documents),
    tokens,
    expand_tilde(&cfg.uploads_dir),
  );
  state
    .people()
    .seed_access_control()
    .await
    .context("failed to seed roles and permissions")?;
  Ok(state)
}

pub fn build_app(state: State) -> Router {
  accolade_api::router(state).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> Result<ServerConfig, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  #[test]
  fn defaults_fill_everything_but_the_secret() {
    let cfg = parse(r#"jwt_secret = "0123456789abcdef0123456789abcdef""#).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.relational_store_path, PathBuf::from("accolade.db"));
    assert_eq!(cfg.uploads_dir, PathBuf::from("uploads"));
    assert_eq!(cfg.token_ttl().unwrap(), chrono::Duration::hours(24));
    assert_eq!(cfg.store_timeout(), Duration::from_secs(5));
  }

  #[test]
  fn secret_is_required() {
    assert!(parse("port = 9000").is_err());
  }

  #[test]
  fn non_positive_ttl_is_rejected() {
    let cfg = parse(
      r#"
        jwt_secret = "0123456789abcdef0123456789abcdef"
        token_ttl_hours = 0
      "#,
    )
    .unwrap();
    assert!(cfg.token_ttl().is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/accolade.db")),
      PathBuf::from(home).join("data/accolade.db")
    );
    assert_eq!(expand_tilde(Path::new("/srv/a.db")), PathBuf::from("/srv/a.db"));
  }

  #[tokio::test]
  async fn short_secret_fails_before_opening_stores() {
    let cfg = parse(r#"jwt_secret = "short""#).unwrap();
    let err = open_state(&cfg).await.err().unwrap();
    assert!(err.to_string().contains("jwt_secret"), "{err:#}");
  }
}
