//! The vote ledger: how a single voter's vote on a single resource changes.
//!
//! Casting the same vote twice cancels it; casting the opposite vote switches
//! it. Every function here is pure: the input mapping is never mutated and a
//! fresh [`Votes`] is returned, so readers of the prior mapping are unaffected
//! while a write is in flight.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  error::InvalidVoteType,
  vote::{VoteType, Votes},
};

/// What a vote request does to the voter's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteTransition {
  /// No prior entry; the vote is inserted.
  Cast { vote: VoteType },
  /// The prior entry matched the request and is removed.
  Retracted { vote: VoteType },
  /// The prior entry was the opposite direction and is replaced.
  Switched { from: VoteType, to: VoteType },
}

impl VoteTransition {
  /// Change in score caused by this transition.
  pub fn score_delta(&self) -> i64 {
    match *self {
      Self::Cast { vote } => vote.weight(),
      Self::Retracted { vote } => -vote.weight(),
      Self::Switched { from, to } => to.weight() - from.weight(),
    }
  }
}

/// Classify the effect of `voter` requesting `requested` against `votes`.
pub fn transition(
  votes: &Votes,
  voter: Uuid,
  requested: VoteType,
) -> VoteTransition {
  match votes.get(voter) {
    None => VoteTransition::Cast { vote: requested },
    Some(existing) if existing == requested => {
      VoteTransition::Retracted { vote: existing }
    }
    Some(existing) => VoteTransition::Switched {
      from: existing,
      to:   requested,
    },
  }
}

/// Apply a vote request and return the new mapping.
pub fn apply_vote(votes: &Votes, voter: Uuid, requested: VoteType) -> Votes {
  match transition(votes, voter, requested) {
    VoteTransition::Cast { vote } | VoteTransition::Switched { to: vote, .. } => {
      votes.with(voter, vote)
    }
    VoteTransition::Retracted { .. } => votes.without(voter),
  }
}

/// [`apply_vote`] for an unvalidated wire value.
///
/// Fails with [`InvalidVoteType`] without producing a mapping when
/// `requested` is neither `"upvote"` nor `"downvote"`.
pub fn cast_vote(
  votes: &Votes,
  voter: Uuid,
  requested: &str,
) -> Result<Votes, InvalidVoteType> {
  let requested = VoteType::parse(requested)?;
  Ok(apply_vote(votes, voter, requested))
}

/// Upvotes minus downvotes.
pub fn score(votes: &Votes) -> i64 { votes.score() }

#[cfg(test)]
mod tests {
  use super::*;

  use crate::vote::VoteType::{Downvote, Upvote};

  fn single(voter: Uuid, vote: VoteType) -> Votes {
    [(voter, vote)].into_iter().collect()
  }

  // ── Scenarios ───────────────────────────────────────────────────────────

  #[test]
  fn first_upvote_is_recorded() {
    let u1 = Uuid::new_v4();
    let next = cast_vote(&Votes::new(), u1, "upvote").unwrap();
    assert_eq!(next, single(u1, Upvote));
    assert_eq!(score(&next), 1);
  }

  #[test]
  fn repeating_an_upvote_removes_it() {
    let u1 = Uuid::new_v4();
    let next = cast_vote(&single(u1, Upvote), u1, "upvote").unwrap();
    assert!(next.is_empty());
    assert_eq!(score(&next), 0);
  }

  #[test]
  fn opposite_vote_switches_the_entry() {
    let u1 = Uuid::new_v4();
    let before = single(u1, Upvote);
    let next = cast_vote(&before, u1, "downvote").unwrap();
    assert_eq!(next, single(u1, Downvote));
    assert_eq!(score(&next), -1);
    assert_eq!(score(&next) - score(&before), -2);
  }

  #[test]
  fn unknown_vote_type_is_rejected_without_a_mapping() {
    let u1 = Uuid::new_v4();
    let before = single(u1, Upvote);
    let err = cast_vote(&before, u1, "meh").unwrap_err();
    assert_eq!(err, InvalidVoteType("meh".to_owned()));
    assert_eq!(before, single(u1, Upvote));
  }

  // ── Properties ──────────────────────────────────────────────────────────

  #[test]
  fn voting_twice_with_the_same_type_is_identity() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let start: Votes = [(a, Upvote), (b, Downvote)].into_iter().collect();

    for voter in [a, b, c] {
      for vote in [Upvote, Downvote] {
        // Only holds when the voter has no vote or already holds this one.
        if start.get(voter).is_some_and(|held| held != vote) {
          continue;
        }
        let twice = apply_vote(&apply_vote(&start, voter, vote), voter, vote);
        assert_eq!(twice, start, "voter {voter} vote {vote}");
      }
    }
  }

  #[test]
  fn switching_then_repeating_removes_the_entry() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let start: Votes = [(a, Upvote), (b, Downvote)].into_iter().collect();

    let switched = apply_vote(&start, a, Downvote);
    assert_eq!(switched.get(a), Some(Downvote));

    let repeated = apply_vote(&switched, a, Downvote);
    assert_eq!(repeated.get(a), None);
    assert_eq!(repeated, single(b, Downvote));
  }

  #[test]
  fn upvote_delta_depends_on_prior_vote() {
    let u = Uuid::new_v4();
    let other = Uuid::new_v4();
    let base: Votes = [(other, Downvote)].into_iter().collect();

    let fresh = apply_vote(&base, u, Upvote);
    assert_eq!(score(&fresh) - score(&base), 1);

    let downvoted = apply_vote(&base, u, Downvote);
    let switched = apply_vote(&downvoted, u, Upvote);
    assert_eq!(score(&switched) - score(&downvoted), 2);
  }

  #[test]
  fn transition_delta_matches_score_change() {
    let u = Uuid::new_v4();
    let states = [Votes::new(), single(u, Upvote), single(u, Downvote)];
    for before in &states {
      for vote in [Upvote, Downvote] {
        let t = transition(before, u, vote);
        let after = apply_vote(before, u, vote);
        assert_eq!(t.score_delta(), score(&after) - score(before));
      }
    }
  }

  #[test]
  fn a_voter_never_holds_more_than_one_entry() {
    let u = Uuid::new_v4();
    let sequence = [Upvote, Upvote, Downvote, Upvote, Downvote, Downvote, Upvote];
    let mut votes = Votes::new();
    for vote in sequence {
      votes = apply_vote(&votes, u, vote);
      assert!(votes.iter().filter(|(voter, _)| *voter == u).count() <= 1);
      assert!(votes.len() <= 1);
    }
    assert_eq!(votes, single(u, Upvote));
  }

  #[test]
  fn input_mapping_is_left_untouched() {
    let u = Uuid::new_v4();
    let before = single(u, Downvote);
    let snapshot = before.clone();
    let _ = apply_vote(&before, u, Upvote);
    let _ = apply_vote(&before, u, Downvote);
    assert_eq!(before, snapshot);
  }

  #[test]
  fn other_voters_are_not_affected() {
    let (u, v) = (Uuid::new_v4(), Uuid::new_v4());
    let before = single(v, Downvote);
    let after = apply_vote(&before, u, Upvote);
    assert_eq!(after.get(v), Some(Downvote));
    assert_eq!(after.get(u), Some(Upvote));
    assert_eq!(score(&after), 0);
  }
}
