//! Error types for `stackit-core`.
//!
//! Every failure here is deterministic: retrying the same call with the same
//! inputs fails the same way.

use thiserror::Error;

/// The caller supplied a vote type other than `upvote` or `downvote`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid vote type: {0:?}")]
pub struct InvalidVoteType(pub String);

/// Identity could not be established for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticationError {
  #[error("no authentication token supplied")]
  Missing,

  #[error("authentication token failed verification")]
  Invalid,

  #[error("token refers to a principal that no longer exists")]
  UnknownPrincipal,

  #[error("principal is banned")]
  Banned,
}

/// Identity was established but lacks the privilege for the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
  #[error("only the author or an admin may do this")]
  NotOwnerOrAdmin,

  #[error("admin role required")]
  NotAdmin,

  #[error("authors may not vote on their own content")]
  SelfVote,

  #[error("banned principals may not mutate content")]
  Banned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error(transparent)]
  InvalidVoteType(#[from] InvalidVoteType),

  #[error(transparent)]
  Authentication(#[from] AuthenticationError),

  #[error(transparent)]
  Authorization(#[from] AuthorizationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
