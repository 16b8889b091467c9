//! Vote types and the per-resource mapping from voter to vote direction.
//!
//! A resource's score is never stored; it is always derived from its
//! [`Votes`] mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidVoteType;

// ─── VoteType ────────────────────────────────────────────────────────────────

/// The direction of a single vote. There is no neutral variant: a voter with
/// no entry in the mapping has not voted.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteType {
  Upvote,
  Downvote,
}

impl VoteType {
  /// Parse the wire form (`"upvote"` / `"downvote"`).
  pub fn parse(raw: &str) -> Result<Self, InvalidVoteType> {
    raw.parse().map_err(|_| InvalidVoteType(raw.to_owned()))
  }

  /// Contribution of one vote of this type to the score.
  pub fn weight(self) -> i64 {
    match self {
      Self::Upvote => 1,
      Self::Downvote => -1,
    }
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// Mapping from voter id to their vote. Keys are unique, so a voter holds at
/// most one entry per resource.
///
/// The public API is read-only; new mappings are produced by
/// [`crate::ledger::apply_vote`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Votes(BTreeMap<Uuid, VoteType>);

impl Votes {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, voter: Uuid) -> Option<VoteType> {
    self.0.get(&voter).copied()
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (Uuid, VoteType)> + '_ {
    self.0.iter().map(|(voter, vote)| (*voter, *vote))
  }

  pub fn upvotes(&self) -> usize {
    self.0.values().filter(|v| **v == VoteType::Upvote).count()
  }

  pub fn downvotes(&self) -> usize {
    self.0.values().filter(|v| **v == VoteType::Downvote).count()
  }

  /// Upvotes minus downvotes, recomputed on every call.
  pub fn score(&self) -> i64 { self.0.values().map(|v| v.weight()).sum() }

  pub fn tally(&self) -> Tally {
    Tally {
      upvotes:   self.upvotes(),
      downvotes: self.downvotes(),
      score:     self.score(),
    }
  }

  pub(crate) fn with(&self, voter: Uuid, vote: VoteType) -> Self {
    let mut next = self.0.clone();
    next.insert(voter, vote);
    Self(next)
  }

  pub(crate) fn without(&self, voter: Uuid) -> Self {
    let mut next = self.0.clone();
    next.remove(&voter);
    Self(next)
  }
}

impl FromIterator<(Uuid, VoteType)> for Votes {
  fn from_iter<I: IntoIterator<Item = (Uuid, VoteType)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// A summary of a [`Votes`] mapping for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub upvotes:   usize,
  pub downvotes: usize,
  pub score:     i64,
}
