//! Questions and answers, the two kinds of resource that carry votes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  guard::ResourceFacts,
  vote::{Tally, Votes},
};

// ─── Votable ─────────────────────────────────────────────────────────────────

/// Identifies a votable resource for reads and vote writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
  Question(Uuid),
  Answer(Uuid),
}

impl VoteTarget {
  pub fn id(&self) -> Uuid {
    match *self {
      Self::Question(id) | Self::Answer(id) => id,
    }
  }

  /// Lowercase resource name, for messages and logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Question(_) => "question",
      Self::Answer(_) => "answer",
    }
  }
}

impl std::fmt::Display for VoteTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.kind(), self.id())
  }
}

/// Anything with an author and a vote mapping.
pub trait Votable {
  fn target(&self) -> VoteTarget;
  fn author(&self) -> Uuid;
  fn votes(&self) -> &Votes;
  /// Optimistic-concurrency counter for vote writes.
  fn version(&self) -> u64;

  fn facts(&self) -> ResourceFacts {
    ResourceFacts {
      author: self.author(),
    }
  }

  fn tally(&self) -> Tally { self.votes().tally() }

  fn score(&self) -> i64 { crate::ledger::score(self.votes()) }
}

/// The fields the vote path needs, read in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSnapshot {
  pub target:  VoteTarget,
  pub author:  Uuid,
  pub votes:   Votes,
  pub version: u64,
}

impl Votable for VoteSnapshot {
  fn target(&self) -> VoteTarget { self.target }

  fn author(&self) -> Uuid { self.author }

  fn votes(&self) -> &Votes { &self.votes }

  fn version(&self) -> u64 { self.version }
}

// ─── Question ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id: Uuid,
  pub title:       String,
  pub description: String,
  pub tags:        Vec<String>,
  pub author:      Uuid,
  pub votes:       Votes,
  pub version:     u64,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Votable for Question {
  fn target(&self) -> VoteTarget { VoteTarget::Question(self.question_id) }

  fn author(&self) -> Uuid { self.author }

  fn votes(&self) -> &Votes { &self.votes }

  fn version(&self) -> u64 { self.version }
}

/// Input to [`crate::store::ForumStore::create_question`].
#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub title:       String,
  pub description: String,
  pub tags:        Vec<String>,
}

/// Partial update of a question; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub tags:        Option<Vec<String>>,
}

// ─── Answer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
  pub answer_id:   Uuid,
  pub question_id: Uuid,
  pub content:     String,
  pub author:      Uuid,
  pub votes:       Votes,
  pub version:     u64,
  pub created_at:  DateTime<Utc>,
}

impl Votable for Answer {
  fn target(&self) -> VoteTarget { VoteTarget::Answer(self.answer_id) }

  fn author(&self) -> Uuid { self.author }

  fn votes(&self) -> &Votes { &self.votes }

  fn version(&self) -> u64 { self.version }
}

/// Input to [`crate::store::ForumStore::create_answer`].
#[derive(Debug, Clone)]
pub struct NewAnswer {
  pub question_id: Uuid,
  pub content:     String,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A question together with all of its answers, oldest answer first.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionThread {
  #[serde(flatten)]
  pub question: Question,
  pub answers:  Vec<Answer>,
}
