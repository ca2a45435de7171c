//! lineage server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! registry and serves the JSON API over HTTP.
//!
//! # Secret hash generation
//!
//! To generate the argon2 PHC string for `private_key_hash`:
//!
//! ```
//! cargo run -p lineage-server -- --hash-secret
//! ```
//!
//! # Admins
//!
//! The API never assigns roles. Promote or demote a person from the host:
//!
//! ```
//! cargo run -p lineage-server -- --grant-admin <person-id>
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use lineage_api::{AppState, FsPhotoStore, SecretConfig};
use lineage_core::{person::Role, store::RegistryStore};
use lineage_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Family registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a secret entered on stdin and exit.
  #[arg(long)]
  hash_secret: bool,

  /// Make the given person an admin and exit.
  #[arg(long, value_name = "PERSON_ID", conflicts_with = "revoke_admin")]
  grant_admin: Option<Uuid>,

  /// Return the given person to member and exit.
  #[arg(long, value_name = "PERSON_ID")]
  revoke_admin: Option<Uuid>,
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

  if cli.hash_secret {
    let secret = read_secret()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.store_path();
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_marital_checks(server_cfg.marital_checks);

  let role_change = match (cli.grant_admin, cli.revoke_admin) {
    (Some(id), _) => Some((id, Some(Role::Admin))),
    (None, Some(id)) => Some((id, Some(Role::Member))),
    (None, None) => None,
  };
  if let Some((id, role)) = role_change {
    let person = store
      .set_role(id, role)
      .await
      .context("failed to update role")?
      .with_context(|| format!("no person with id {id}"))?;
    tracing::info!(person_id = %id, role = ?person.role, "role updated");
    return Ok(());
  }

  let private_key_hash = server_cfg.private_key_hash()?.to_owned();
  let state = AppState {
    store:  Arc::new(store),
    photos: Arc::new(FsPhotoStore::new(
      server_cfg.photo_dir(),
      server_cfg.photo_base_url.clone(),
    )),
    secret: Arc::new(SecretConfig { private_key_hash }),
  };

  let marital_checks = state.store.marital_checks();
  let app = lineage_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(%marital_checks, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read the shared secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Secret: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let secret = line.trim_end_matches(['\n', '\r']).to_owned();
  anyhow::ensure!(!secret.is_empty(), "secret must not be empty");
  Ok(secret)
}
