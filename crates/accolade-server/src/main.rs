//! accolade server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `ACCOLADE_*`
//! environment variables, opens both SQLite stores, and serves the REST API.
//!
//! # First administrator
//!
//! ```text
//! accolade --bootstrap-admin admin --email admin@example.edu < password.txt
//! ```

use std::path::PathBuf;

use accolade_api::password::hash_password_blocking;
use accolade_server::{ServerConfig, build_app, open_state};
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Student achievement tracking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an administrator with this username, reading the password from
  /// stdin, and exit.
  #[arg(long, value_name = "USERNAME")]
  bootstrap_admin: Option<String>,

  /// Email for the bootstrapped administrator.
  #[arg(long, requires = "bootstrap_admin", default_value = "")]
  email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;
  let state = open_state(&cfg).await?;

  if let Some(username) = cli.bootstrap_admin {
    let password = read_password()?;
    let hash = hash_password_blocking(password)
      .await
      .context("failed to hash password")?;
    let user = state
      .people()
      .bootstrap_admin(&username, &cli.email, &username, hash)
      .await
      .context("failed to create administrator")?;
    println!("created administrator {} ({})", user.username, user.id);
    return Ok(());
  }

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, build_app(state))
    .await
    .context("server error")?;

  Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
