//! stackit-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `STACKIT_*` environment variables over it, opens the SQLite store, and
//! serves the JSON API over HTTP.
//!
//! # Bootstrapping an admin
//!
//! Register through the API, then promote the account:
//!
//! ```
//! cargo run -p stackit-server --bin server -- --promote-admin you@example.com
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use stackit_core::{
  principal::{Role, UserPatch},
  store::{ForumStore, WriteOutcome},
};
use stackit_server::{AppState, ServerConfig};
use stackit_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// HS256 keys shorter than this are refused at startup.
const MIN_SECRET_LEN: usize = 32;

#[derive(Parser)]
#[command(author, version, about = "StackIt Q&A server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Give the account with this email the admin role and exit.
  #[arg(long, value_name = "EMAIL")]
  promote_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("STACKIT")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  anyhow::ensure!(
    server_cfg.jwt_secret.len() >= MIN_SECRET_LEN,
    "jwt_secret must be at least {MIN_SECRET_LEN} bytes"
  );

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: promote an account and exit.
  if let Some(email) = cli.promote_admin {
    return promote_admin(&store, &email).await;
  }

  let state = AppState::new(store, &server_cfg);
  let app = stackit_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    ban_enforcement = ?server_cfg.ban_enforcement,
    self_votes = ?server_cfg.self_votes,
    cors_origins = ?server_cfg.cors_origins,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn promote_admin(store: &SqliteStore, email: &str) -> anyhow::Result<()> {
  let email = email.trim().to_lowercase();
  let user = store
    .find_user_by_email(&email)
    .await?
    .with_context(|| format!("no account with email {email}"))?;

  let patch = UserPatch {
    role: Some(Role::Admin),
    ..UserPatch::default()
  };
  match store.update_user(user.user_id, patch).await? {
    WriteOutcome::Written(user) => {
      tracing::info!(user_id = %user.user_id, "promoted {} to admin", user.username);
      Ok(())
    }
    other => anyhow::bail!("could not promote {email}: {other:?}"),
  }
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
