//! Handlers for `POST /api/questions/{id}/vote` and `POST /api/answers/{id}/vote`.
//!
//! Body: `{"voteType": "upvote" | "downvote"}`. Repeating a vote retracts it;
//! the opposite vote switches it. The response is the resource with its new
//! tally and the transition that was applied.
//!
//! A vote is a read-apply-write cycle against the resource's vote mapping.
//! The write only lands if the resource's version is unchanged since the
//! read; on a lost race the whole cycle is re-run, up to
//! [`MAX_VOTE_ATTEMPTS`] times.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use stackit_core::{
  guard::{Action, Allow},
  ledger::{VoteTransition, apply_vote, transition},
  principal::Principal,
  store::{Conflict, ForumStore, WriteOutcome},
  votable::{Answer, Question, Votable, VoteTarget},
  vote::VoteType,
};
use uuid::Uuid;

use super::{Scored, answers, questions};
use crate::{
  AppState,
  auth::CurrentUser,
  error::{Error, Result},
};

pub const MAX_VOTE_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  /// Kept as a string so an unknown value is a 400 with our own message.
  #[serde(alias = "vote_type")]
  pub vote_type: String,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse<T> {
  #[serde(flatten)]
  pub resource:   Scored<T>,
  pub transition: VoteTransition,
}

/// Run the vote cycle for `principal` on `target`.
pub async fn cast<S>(
  state: &AppState<S>,
  principal: &Principal,
  target: VoteTarget,
  raw_vote: &str,
) -> Result<VoteTransition>
where
  S: ForumStore + Clone + 'static,
{
  for attempt in 1..=MAX_VOTE_ATTEMPTS {
    let snapshot = state
      .store
      .vote_snapshot(target)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(target.kind()))?;

    let vote = VoteType::parse(raw_vote)?;
    let Allow =
      state
        .guard
        .authorize_mutation(principal, &snapshot.facts(), Action::Vote)?;

    let change = transition(&snapshot.votes, principal.id, vote);
    let votes = apply_vote(&snapshot.votes, principal.id, vote);

    match state
      .store
      .save_votes(target, snapshot.version, &votes)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Written(version) => {
        tracing::debug!(
          %target,
          voter = %principal.id,
          transition = ?change,
          delta = change.score_delta(),
          version,
          "vote recorded"
        );
        return Ok(change);
      }
      WriteOutcome::NotFound => return Err(Error::NotFound(target.kind())),
      WriteOutcome::Conflict(Conflict::Version { current }) => {
        tracing::debug!(%target, attempt, current, "vote write lost a race, retrying");
      }
      WriteOutcome::Conflict(conflict) => return Err(conflict.into()),
    }
  }

  tracing::warn!(%target, voter = %principal.id, "vote abandoned after repeated conflicts");
  Err(Error::Conflict(format!(
    "{target} is being voted on concurrently, try again"
  )))
}

/// `POST /api/questions/{id}/vote`
pub async fn question<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<VoteBody>,
) -> Result<Json<VoteResponse<Question>>>
where
  S: ForumStore + Clone + 'static,
{
  let transition =
    cast(&state, &current.principal, VoteTarget::Question(id), &body.vote_type)
      .await?;
  let question = questions::load(&state, id).await?;
  Ok(Json(VoteResponse {
    resource: question.into(),
    transition,
  }))
}

/// `POST /api/answers/{id}/vote`
pub async fn answer<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<VoteBody>,
) -> Result<Json<VoteResponse<Answer>>>
where
  S: ForumStore + Clone + 'static,
{
  let transition =
    cast(&state, &current.principal, VoteTarget::Answer(id), &body.vote_type)
      .await?;
  let answer = answers::load(&state, id).await?;
  Ok(Json(VoteResponse {
    resource: answer.into(),
    transition,
  }))
}
