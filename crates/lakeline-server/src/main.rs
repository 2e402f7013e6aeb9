//! `lakeline-server`: the catalog's HTTP entry point.
//!
//! Settings come from a TOML file (`--config`, default `config.toml`) with
//! `LAKELINE_*` environment variables layered on top; see
//! [`settings::ServerConfig`]. The API is mounted under `/api/v1`.
//!
//! `--hash-password` reads a password from stdin, prints the argon2 PHC string
//! to put in `auth_password_hash`, and exits without touching the store.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::Router;
use clap::Parser;
use lakeline_api::{AppState, AuthConfig};
use lakeline_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Lakeline lineage catalog server")]
struct Cli {
  /// TOML settings file; a missing file leaves only the environment.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Hash a password read from stdin for `auth_password_hash`, then exit.
  #[arg(long)]
  hash_password: bool,
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
  if cli.hash_password {
    return print_password_hash();
  }
  serve(ServerConfig::load(cli.config)?).await
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("cannot open catalog at {}", cfg.store_path.display()))?;

  let mut state = AppState::new(store, AuthConfig {
    username:      cfg.auth_username.clone(),
    password_hash: cfg.auth_password_hash.clone(),
  });
  match cfg.keystore_passphrase.clone() {
    Some(passphrase) => state = state.with_keystore(passphrase),
    None => tracing::warn!("keystore_passphrase is unset; keystore writes will fail"),
  }

  let app = Router::new()
    .nest("/api/v1", lakeline_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("cannot bind {address}"))?;
  tracing::info!(%address, "serving /api/v1");

  axum::serve(listener, app).await.context("server stopped")
}

fn print_password_hash() -> anyhow::Result<()> {
  use std::io::{self, BufRead, Write};

  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  println!("{hash}");
  Ok(())
}
