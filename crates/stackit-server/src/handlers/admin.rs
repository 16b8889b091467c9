//! Handlers for `/api/admin` endpoints. Every route requires the admin role.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/users`           | Password hashes are never serialised |
//! | `PUT`    | `/admin/users/{id}`      | Body: `{"username"?,"email"?,"role"?,"banned"?}` |
//! | `DELETE` | `/admin/users/{id}`      | |
//! | `GET`    | `/admin/stats`           | `{"userCount","questionCount"}` |
//! | `GET`    | `/admin/questions`       | |
//! | `DELETE` | `/admin/questions/{id}`  | Force delete, regardless of author |

use axum::{
  Json,
  extract::{Path, State},
};
use serde_json::Value;
use stackit_core::{
  principal::{User, UserPatch},
  store::{ForumStore, Stats, WriteOutcome},
  votable::{Question, Votable},
};
use uuid::Uuid;

use super::{Authors, Scored, message};
use crate::{
  AppState,
  auth::AdminUser,
  error::{Error, Result},
  validate,
};

// ─── Users ────────────────────────────────────────────────────────────────────

/// `GET /api/admin/users`
pub async fn users<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<User>>>
where
  S: ForumStore + Clone + 'static,
{
  let users = state.store.list_users().await.map_err(Error::store)?;
  Ok(Json(users))
}

/// `PUT /api/admin/users/{id}`
pub async fn update_user<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
  Json(mut patch): Json<UserPatch>,
) -> Result<Json<User>>
where
  S: ForumStore + Clone + 'static,
{
  patch.username = patch.username.map(|u| u.trim().to_string());
  patch.email = patch.email.map(|e| e.trim().to_lowercase());
  validate::user_patch(patch.username.as_deref(), patch.email.as_deref())?;

  let user = match state.store.update_user(id, patch).await.map_err(Error::store)? {
    WriteOutcome::Written(user) => user,
    WriteOutcome::NotFound => return Err(Error::NotFound("user")),
    WriteOutcome::Conflict(conflict) => return Err(conflict.into()),
  };

  tracing::info!(
    user_id = %id,
    admin = %admin.principal.id,
    role = %user.role,
    banned = user.banned,
    "user updated by admin"
  );
  Ok(Json(user))
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>>
where
  S: ForumStore + Clone + 'static,
{
  if !state.store.delete_user(id).await.map_err(Error::store)? {
    return Err(Error::NotFound("user"));
  }
  tracing::info!(user_id = %id, admin = %admin.principal.id, "user deleted by admin");
  Ok(message("user deleted"))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /api/admin/stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Stats>>
where
  S: ForumStore + Clone + 'static,
{
  Ok(Json(state.store.stats().await.map_err(Error::store)?))
}

// ─── Questions ────────────────────────────────────────────────────────────────

/// `GET /api/admin/questions`
pub async fn questions<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<Scored<Question>>>>
where
  S: ForumStore + Clone + 'static,
{
  let questions = state.store.list_questions().await.map_err(Error::store)?;
  let authors = Authors::load(&state, questions.iter().map(Votable::author)).await?;
  Ok(Json(authors.score_all(questions)))
}

/// `DELETE /api/admin/questions/{id}`
pub async fn delete_question<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>>
where
  S: ForumStore + Clone + 'static,
{
  if !state.store.delete_question(id).await.map_err(Error::store)? {
    return Err(Error::NotFound("question"));
  }
  tracing::info!(question_id = %id, admin = %admin.principal.id, "question force-deleted");
  Ok(message("question deleted"))
}
