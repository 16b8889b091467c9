//! The `ForumStore` trait and supporting outcome types.
//!
//! The trait is implemented by storage backends (e.g. `stackit-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  principal::{NewUser, User, UserPatch},
  votable::{
    Answer, NewAnswer, NewQuestion, Question, QuestionPatch, QuestionThread,
    VoteSnapshot, VoteTarget,
  },
  vote::Votes,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Why a write was refused without a backend failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
  /// The row's version moved on since it was read.
  Version { current: u64 },
  /// A unique field (`"email"`, `"username"`) is already taken.
  Duplicate { field: &'static str },
}

/// Result of a write that may be refused by a uniqueness or version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
  Written(T),
  NotFound,
  Conflict(Conflict),
}

/// Site-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub user_count:     u64,
  pub question_count: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a StackIt storage backend.
///
/// Vote mappings are written only through [`ForumStore::save_votes`], which
/// refuses the write if the resource's version changed since it was read.
/// Callers retry the read-apply-write cycle on [`Conflict::Version`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ForumStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create an account. Refused with [`Conflict::Duplicate`] if the username
  /// or email is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<WriteOutcome<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// The accounts among `ids`, in the order given. Ids with no account are
  /// skipped.
  fn get_users<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<WriteOutcome<User>, Self::Error>> + Send + '_;

  /// Returns `false` if no such user existed.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Questions ─────────────────────────────────────────────────────────

  /// Create a question with an empty vote mapping.
  fn create_question(
    &self,
    author: Uuid,
    input: NewQuestion,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  fn get_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  /// A question with its answers. Returns `None` if the question is missing.
  fn get_thread(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<QuestionThread>, Self::Error>> + Send + '_;

  /// All questions, newest first.
  fn list_questions(
    &self,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  fn update_question(
    &self,
    id: Uuid,
    patch: QuestionPatch,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  /// Delete a question and, with it, all of its answers and their votes.
  /// Returns `false` if no such question existed.
  fn delete_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Answers ───────────────────────────────────────────────────────────

  /// Create an answer with an empty vote mapping. Returns `NotFound` if the
  /// question does not exist.
  fn create_answer(
    &self,
    author: Uuid,
    input: NewAnswer,
  ) -> impl Future<Output = Result<WriteOutcome<Answer>, Self::Error>> + Send + '_;

  fn get_answer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Answer>, Self::Error>> + Send + '_;

  fn update_answer(
    &self,
    id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Option<Answer>, Self::Error>> + Send + '_;

  fn delete_answer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Read the author, vote mapping and version of a question or answer.
  fn vote_snapshot(
    &self,
    target: VoteTarget,
  ) -> impl Future<Output = Result<Option<VoteSnapshot>, Self::Error>> + Send + '_;

  /// Replace the vote mapping of `target` if its version still equals
  /// `expected_version`. On success the version is bumped and the new value
  /// returned.
  fn save_votes<'a>(
    &'a self,
    target: VoteTarget,
    expected_version: u64,
    votes: &'a Votes,
  ) -> impl Future<Output = Result<WriteOutcome<u64>, Self::Error>> + Send + 'a;

  // ── Admin ─────────────────────────────────────────────────────────────

  fn stats(
    &self,
  ) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;
}
