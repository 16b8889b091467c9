//! Handlers for `/api/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"name","email","password"}` → 201 |
//! | `POST` | `/auth/login`    | Body: `{"email","password"}` |
//! | `GET`  | `/auth/me`       | Bearer token required |

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use stackit_core::{
  principal::{NewUser, User},
  store::{ForumStore, WriteOutcome},
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::{Error, Result},
  password, validate,
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token: String,
  pub user:  User,
}

/// Emails are matched case-insensitively.
fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<AuthResponse>)>
where
  S: ForumStore + Clone + 'static,
{
  let name = body.name.trim();
  let email = normalize_email(&body.email);
  validate::registration(name, &email, &body.password)?;

  let input = NewUser {
    username:      name.to_string(),
    email,
    password_hash: password::hash_password(&body.password)?,
  };
  let user = match state.store.create_user(input).await.map_err(Error::store)? {
    WriteOutcome::Written(user) => user,
    WriteOutcome::Conflict(conflict) => return Err(conflict.into()),
    WriteOutcome::NotFound => return Err(Error::NotFound("user")),
  };

  tracing::info!(user_id = %user.user_id, username = %user.username, "registered user");
  let token = state.tokens.issue(&user)?;
  Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /api/auth/login`
///
/// Unknown email and wrong password give the same answer. The ban check runs
/// only once the password is proven, so it does not reveal who is banned.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>>
where
  S: ForumStore + Clone + 'static,
{
  let email = normalize_email(&body.email);
  validate::login(&email, &body.password)?;

  let invalid = || Error::BadRequest("invalid credentials".into());
  let user = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(Error::store)?
    .ok_or_else(invalid)?;

  if !password::verify_password(&body.password, &user.password_hash) {
    return Err(invalid());
  }
  state.guard.admit_login(&user.principal())?;

  tracing::info!(user_id = %user.user_id, "user logged in");
  let token = state.tokens.issue(&user)?;
  Ok(Json(AuthResponse { token, user }))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /api/auth/me`
pub async fn me(current: CurrentUser) -> Json<User> { Json(current.user) }
