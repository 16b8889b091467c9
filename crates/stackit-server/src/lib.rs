//! JSON HTTP API for StackIt.
//!
//! Exposes an axum [`Router`] backed by any [`ForumStore`]. Every mutating
//! route resolves the caller through the access guard before touching the
//! store; vote routes then run the vote ledger under an optimistic version
//! check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod password;
pub mod token;
pub mod validate;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  http::{HeaderValue, Method, StatusCode, Uri, header},
  response::IntoResponse,
  routing::{delete, get, post, put},
};
use serde::{Deserialize, Deserializer, de};
use serde_json::json;
use stackit_core::{
  guard::{AccessGuard, BanEnforcement, GuardPolicy, SelfVotePolicy},
  store::ForumStore,
};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

use handlers::{admin, answers, questions, votes};
use token::TokenIssuer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STACKIT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// HS256 signing key for bearer tokens.
  pub jwt_secret:      String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours: i64,
  #[serde(default)]
  pub ban_enforcement: BanEnforcement,
  #[serde(default)]
  pub self_votes:      SelfVotePolicy,
  /// Browser origins allowed to call the API, e.g. the web and admin SPAs.
  #[serde(
    default = "default_cors_origins",
    deserialize_with = "deserialize_origins"
  )]
  pub cors_origins:    Vec<HeaderValue>,
}

fn default_token_ttl_hours() -> i64 { 7 * 24 }

fn default_cors_origins() -> Vec<HeaderValue> {
  vec![
    HeaderValue::from_static("http://localhost:5173"),
    HeaderValue::from_static("http://localhost:5174"),
  ]
}

/// Origins must be concrete; a `*` wildcard cannot be combined with
/// credentialed requests.
fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<HeaderValue>, D::Error>
where
  D: Deserializer<'de>,
{
  Vec::<String>::deserialize(deserializer)?
    .into_iter()
    .map(|origin| -> Result<HeaderValue, D::Error> {
      if origin.trim() == "*" {
        return Err(de::Error::custom("cors_origins may not contain \"*\""));
      }
      HeaderValue::from_str(origin.trim()).map_err(de::Error::custom)
    })
    .collect()
}

impl ServerConfig {
  pub fn guard_policy(&self) -> GuardPolicy {
    GuardPolicy {
      ban_enforcement: self.ban_enforcement,
      self_votes:      self.self_votes,
    }
  }

  pub fn token_ttl(&self) -> chrono::Duration {
    chrono::Duration::hours(self.token_ttl_hours)
  }

  /// CORS for the configured origins, with credentials and the bearer
  /// header allowed.
  pub fn cors_layer(&self) -> CorsLayer {
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(self.cors_origins.iter().cloned()))
      .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
      ])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
      .allow_credentials(true)
      .max_age(Duration::from_secs(60 * 60))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ForumStore> {
  pub store:  Arc<S>,
  pub guard:  Arc<AccessGuard>,
  pub tokens: Arc<TokenIssuer>,
  pub cors:   CorsLayer,
}

impl<S: ForumStore> AppState<S> {
  pub fn new(store: S, config: &ServerConfig) -> Self {
    Self {
      store:  Arc::new(store),
      guard:  Arc::new(AccessGuard::new(config.guard_policy())),
      tokens: Arc::new(TokenIssuer::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl(),
      )),
      cors:   config.cors_layer(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: health check at `/`, the API under
/// `/api`, JSON 404s for everything else. CORS wraps all of it, so
/// preflights are answered before routing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ForumStore + Clone + 'static,
{
  let api = Router::new()
    // Auth
    .route("/auth/register",        post(handlers::auth::register::<S>))
    .route("/auth/login",           post(handlers::auth::login::<S>))
    .route("/auth/me",              get(handlers::auth::me))
    // Questions
    .route("/questions",            get(questions::list::<S>).post(questions::create::<S>))
    .route(
      "/questions/{id}",
      get(questions::get_one::<S>)
        .put(questions::update::<S>)
        .delete(questions::remove::<S>),
    )
    .route("/questions/{id}/vote",  post(votes::question::<S>))
    // Answers
    .route("/answers",              post(answers::create::<S>))
    .route("/answers/{id}",         put(answers::update::<S>).delete(answers::remove::<S>))
    .route("/answers/{id}/vote",    post(votes::answer::<S>))
    // Admin
    .route("/admin/users",          get(admin::users::<S>))
    .route("/admin/users/{id}",     put(admin::update_user::<S>).delete(admin::delete_user::<S>))
    .route("/admin/stats",          get(admin::stats::<S>))
    .route("/admin/questions",      get(admin::questions::<S>))
    .route("/admin/questions/{id}", delete(admin::delete_question::<S>));

  let cors = state.cors.clone();
  Router::new()
    .route("/", get(health))
    .nest("/api", api)
    .fallback(not_found)
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

async fn health() -> impl IntoResponse {
  Json(json!({
    "message": "StackIt API running!",
    "version": env!("CARGO_PKG_VERSION"),
  }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
  (
    StatusCode::NOT_FOUND,
    Json(json!({ "message": format!("not found: {}", uri.path()) })),
  )
}

// ─── Test support ─────────────────────────────────────────────────────────────


// ─── Integration tests ────────────────────────────────────────────────────────
