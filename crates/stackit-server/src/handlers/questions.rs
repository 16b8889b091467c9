//! Handlers for `/api/questions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/questions`      | Newest first, with `author_profile` |
//! | `POST`   | `/questions`      | Body: `{"title","description","tags"?}` → 201 |
//! | `GET`    | `/questions/{id}` | Question with its answers and their authors; 404 if missing |
//! | `PUT`    | `/questions/{id}` | Author or admin; partial update |
//! | `DELETE` | `/questions/{id}` | Author or admin; takes the answers with it |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use stackit_core::{
  guard::{Action, Allow},
  store::ForumStore,
  votable::{NewQuestion, Question, QuestionPatch, Votable},
};
use uuid::Uuid;

use super::{Authors, Scored, ThreadView, message};
use crate::{
  AppState,
  auth::CurrentUser,
  error::{Error, Result},
  validate,
};

/// Tags are stored trimmed and lowercase.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
  tags.into_iter().map(|t| t.trim().to_lowercase()).collect()
}

/// Load a question or 404.
pub(super) async fn load<S>(state: &AppState<S>, id: Uuid) -> Result<Question>
where
  S: ForumStore + Clone + 'static,
{
  state
    .store
    .get_question(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound("question"))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /api/questions`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Scored<Question>>>>
where
  S: ForumStore + Clone + 'static,
{
  let questions = state.store.list_questions().await.map_err(Error::store)?;
  let authors = Authors::load(&state, questions.iter().map(Votable::author)).await?;
  Ok(Json(authors.score_all(questions)))
}

/// `GET /api/questions/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ThreadView>>
where
  S: ForumStore + Clone + 'static,
{
  let thread = state
    .store
    .get_thread(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound("question"))?;
  let authors = Authors::load(
    &state,
    std::iter::once(thread.question.author)
      .chain(thread.answers.iter().map(|a| a.author)),
  )
  .await?;
  Ok(Json(ThreadView::new(thread, &authors)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub tags:        Vec<String>,
}

/// `POST /api/questions`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Scored<Question>>)>
where
  S: ForumStore + Clone + 'static,
{
  let tags = normalize_tags(body.tags);
  validate::question(
    Some(body.title.as_str()),
    Some(body.description.as_str()),
    Some(tags.as_slice()),
  )?;

  let input = NewQuestion {
    title: body.title,
    description: body.description,
    tags,
  };
  let question = state
    .store
    .create_question(current.principal.id, input)
    .await
    .map_err(Error::store)?;

  tracing::info!(question_id = %question.question_id, author = %question.author, "question created");
  Ok((StatusCode::CREATED, Json(question.into())))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub tags:        Option<Vec<String>>,
}

/// `PUT /api/questions/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Scored<Question>>>
where
  S: ForumStore + Clone + 'static,
{
  let tags = body.tags.map(normalize_tags);
  validate::question(
    body.title.as_deref(),
    body.description.as_deref(),
    tags.as_deref(),
  )?;

  let question = load(&state, id).await?;
  let Allow = state.guard.authorize_mutation(
    &current.principal,
    &question.facts(),
    Action::Edit,
  )?;

  let patch = QuestionPatch {
    title: body.title,
    description: body.description,
    tags,
  };
  let question = state
    .store
    .update_question(id, patch)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound("question"))?;

  tracing::info!(question_id = %id, editor = %current.principal.id, "question updated");
  Ok(Json(question.into()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/questions/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>>
where
  S: ForumStore + Clone + 'static,
{
  let question = load(&state, id).await?;
  let Allow = state.guard.authorize_mutation(
    &current.principal,
    &question.facts(),
    Action::Delete,
  )?;

  if !state.store.delete_question(id).await.map_err(Error::store)? {
    return Err(Error::NotFound("question"));
  }

  tracing::info!(question_id = %id, by = %current.principal.id, "question deleted");
  Ok(message("question deleted"))
}
