pub mod admin;
pub mod answers;
pub mod auth;
pub mod questions;
pub mod votes;

use std::collections::{BTreeSet, HashMap};

use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};
use stackit_core::{
  principal::User,
  store::ForumStore,
  votable::{Answer, Question, QuestionThread, Votable},
  vote::Tally,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
};

/// The public face of an author, embedded in listings and threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
  pub user_id:  Uuid,
  pub username: String,
  pub email:    String,
}

impl From<User> for AuthorSummary {
  fn from(user: User) -> Self {
    Self {
      user_id:  user.user_id,
      username: user.username,
      email:    user.email,
    }
  }
}

/// A votable resource together with its current tally.
#[derive(Debug, Serialize)]
pub struct Scored<T> {
  #[serde(flatten)]
  pub item:           T,
  pub tally:          Tally,
  /// Absent when the author's account is gone or the route does not expand
  /// authors.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author_profile: Option<AuthorSummary>,
}

impl<T: Votable> From<T> for Scored<T> {
  fn from(item: T) -> Self {
    Self {
      tally: item.tally(),
      author_profile: None,
      item,
    }
  }
}

/// Author summaries for a batch of votables, fetched in one store call.
pub(super) struct Authors(HashMap<Uuid, AuthorSummary>);

impl Authors {
  pub(super) async fn load<S>(
    state: &AppState<S>,
    ids: impl IntoIterator<Item = Uuid>,
  ) -> Result<Self>
  where
    S: ForumStore + Clone + 'static,
  {
    let ids: BTreeSet<Uuid> = ids.into_iter().collect();
    let ids: Vec<Uuid> = ids.into_iter().collect();
    let users = state.store.get_users(&ids).await.map_err(Error::store)?;
    Ok(Self(
      users
        .into_iter()
        .map(|u| (u.user_id, AuthorSummary::from(u)))
        .collect(),
    ))
  }

  pub(super) fn score<T: Votable>(&self, item: T) -> Scored<T> {
    let author_profile = self.0.get(&item.author()).cloned();
    Scored {
      author_profile,
      ..Scored::from(item)
    }
  }

  pub(super) fn score_all<T: Votable>(&self, items: Vec<T>) -> Vec<Scored<T>> {
    items.into_iter().map(|item| self.score(item)).collect()
  }
}

/// `GET /api/questions/{id}` body: the scored question with scored answers.
#[derive(Debug, Serialize)]
pub struct ThreadView {
  #[serde(flatten)]
  pub question: Scored<Question>,
  pub answers:  Vec<Scored<Answer>>,
}

impl ThreadView {
  pub(super) fn new(thread: QuestionThread, authors: &Authors) -> Self {
    Self {
      question: authors.score(thread.question),
      answers:  authors.score_all(thread.answers),
    }
  }
}

pub(super) fn message(text: &str) -> Json<Value> {
  Json(json!({ "message": text }))
}
