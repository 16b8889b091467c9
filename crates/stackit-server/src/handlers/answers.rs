//! Handlers for `/api/answers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/answers`      | Body: `{"questionId","content"}` → 201; 404 if the question is missing |
//! | `PUT`    | `/answers/{id}` | Author or admin; body: `{"content"}` |
//! | `DELETE` | `/answers/{id}` | Author or admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use stackit_core::{
  guard::{Action, Allow},
  store::{ForumStore, WriteOutcome},
  votable::{Answer, NewAnswer, Votable},
};
use uuid::Uuid;

use super::{Scored, message};
use crate::{
  AppState,
  auth::CurrentUser,
  error::{Error, Result},
  validate,
};

/// Load an answer or 404.
pub(super) async fn load<S>(state: &AppState<S>, id: Uuid) -> Result<Answer>
where
  S: ForumStore + Clone + 'static,
{
  state
    .store
    .get_answer(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound("answer"))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[serde(alias = "question_id")]
  pub question_id: Uuid,
  pub content:     String,
}

/// `POST /api/answers`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Scored<Answer>>)>
where
  S: ForumStore + Clone + 'static,
{
  validate::answer(&body.content)?;

  let input = NewAnswer {
    question_id: body.question_id,
    content:     body.content,
  };
  let outcome = state
    .store
    .create_answer(current.principal.id, input)
    .await
    .map_err(Error::store)?;

  let answer = match outcome {
    WriteOutcome::Written(answer) => answer,
    WriteOutcome::NotFound => return Err(Error::NotFound("question")),
    WriteOutcome::Conflict(conflict) => return Err(conflict.into()),
  };

  tracing::info!(
    answer_id = %answer.answer_id,
    question_id = %answer.question_id,
    author = %answer.author,
    "answer created"
  );
  Ok((StatusCode::CREATED, Json(answer.into())))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub content: String,
}

/// `PUT /api/answers/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Scored<Answer>>>
where
  S: ForumStore + Clone + 'static,
{
  validate::answer(&body.content)?;

  let answer = load(&state, id).await?;
  let Allow = state.guard.authorize_mutation(
    &current.principal,
    &answer.facts(),
    Action::Edit,
  )?;

  let answer = state
    .store
    .update_answer(id, body.content)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound("answer"))?;

  tracing::info!(answer_id = %id, editor = %current.principal.id, "answer updated");
  Ok(Json(answer.into()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/answers/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>>
where
  S: ForumStore + Clone + 'static,
{
  let answer = load(&state, id).await?;
  let Allow = state.guard.authorize_mutation(
    &current.principal,
    &answer.facts(),
    Action::Delete,
  )?;

  if !state.store.delete_answer(id).await.map_err(Error::store)? {
    return Err(Error::NotFound("answer"));
  }

  tracing::info!(answer_id = %id, by = %current.principal.id, "answer deleted");
  Ok(message("answer deleted"))
}
