//! The access guard: who is making a request, and may they do this?
//!
//! A request moves `Unauthenticated → Authenticated → Authorized | Denied`
//! and stops at the first failure. Each step is a pure check over facts the
//! caller has already fetched; the guard never touches storage or crypto
//! itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  error::{AuthenticationError, AuthorizationError},
  principal::Principal,
};

// ─── Collaborators ───────────────────────────────────────────────────────────

/// Checks a bearer token's signature and expiry.
///
/// Returns the subject (user id) the token was issued for, or `None` if the
/// token does not verify. Token format and key material belong to the
/// implementor.
pub trait TokenVerifier {
  fn verify(&self, token: &str) -> Option<Uuid>;
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Where the `banned` flag is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanEnforcement {
  /// Every authenticated request re-checks the flag; a ban takes effect
  /// immediately, even for outstanding tokens.
  #[default]
  EveryRequest,
  /// Only password login checks the flag at authentication. Tokens issued
  /// before the ban still authenticate, but every mutation is refused.
  LoginOnly,
}

/// Whether authors may vote on their own questions and answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfVotePolicy {
  #[default]
  Allow,
  Forbid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardPolicy {
  pub ban_enforcement: BanEnforcement,
  pub self_votes:      SelfVotePolicy,
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// A mutation a principal wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Edit,
  Delete,
  Vote,
  /// Ban/unban, force-delete, stats; anything under the admin surface.
  AdminOperation,
}

/// What the guard needs to know about the resource being mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceFacts {
  pub author: Uuid,
}

/// Proof that a mutation was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Allow;

// ─── Guard ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
  policy: GuardPolicy,
}

impl AccessGuard {
  pub fn new(policy: GuardPolicy) -> Self { Self { policy } }

  pub fn policy(&self) -> GuardPolicy { self.policy }

  // ── Authentication ──────────────────────────────────────────────────────

  /// First half of authentication: token → subject id.
  pub fn verify<V>(
    &self,
    token: Option<&str>,
    verifier: &V,
  ) -> Result<Uuid, AuthenticationError>
  where
    V: TokenVerifier + ?Sized,
  {
    let token = token.ok_or(AuthenticationError::Missing)?;
    verifier.verify(token).ok_or(AuthenticationError::Invalid)
  }

  /// Second half of authentication: subject id + the principal the caller
  /// looked up for it → admitted principal.
  pub fn admit(
    &self,
    subject: Uuid,
    found: Option<Principal>,
  ) -> Result<Principal, AuthenticationError> {
    let principal = found
      .filter(|p| p.id == subject)
      .ok_or(AuthenticationError::UnknownPrincipal)?;

    if principal.banned
      && self.policy.ban_enforcement == BanEnforcement::EveryRequest
    {
      return Err(AuthenticationError::Banned);
    }
    Ok(principal)
  }

  /// Gate for password login. Bans always apply here, whatever the policy.
  pub fn admit_login(
    &self,
    principal: &Principal,
  ) -> Result<(), AuthenticationError> {
    if principal.banned {
      return Err(AuthenticationError::Banned);
    }
    Ok(())
  }

  /// Resolve a request's identity with a synchronous principal lookup.
  pub fn authenticate<V, F>(
    &self,
    token: Option<&str>,
    verifier: &V,
    lookup: F,
  ) -> Result<Principal, AuthenticationError>
  where
    V: TokenVerifier + ?Sized,
    F: FnOnce(Uuid) -> Option<Principal>,
  {
    let subject = self.verify(token, verifier)?;
    self.admit(subject, lookup(subject))
  }

  // ── Authorization ───────────────────────────────────────────────────────

  /// Decide whether `principal` may perform `action` on `resource`.
  pub fn authorize_mutation(
    &self,
    principal: &Principal,
    resource: &ResourceFacts,
    action: Action,
  ) -> Result<Allow, AuthorizationError> {
    if principal.banned {
      return Err(AuthorizationError::Banned);
    }

    match action {
      Action::Edit | Action::Delete => {
        if principal.id == resource.author || principal.is_admin() {
          Ok(Allow)
        } else {
          Err(AuthorizationError::NotOwnerOrAdmin)
        }
      }
      Action::Vote => {
        if principal.id == resource.author
          && self.policy.self_votes == SelfVotePolicy::Forbid
        {
          Err(AuthorizationError::SelfVote)
        } else {
          Ok(Allow)
        }
      }
      Action::AdminOperation => self.require_admin(principal),
    }
  }

  /// Decide whether `principal` may use the admin surface. Admin operations
  /// have no owning resource.
  pub fn require_admin(
    &self,
    principal: &Principal,
  ) -> Result<Allow, AuthorizationError> {
    if principal.banned {
      return Err(AuthorizationError::Banned);
    }
    if principal.is_admin() {
      Ok(Allow)
    } else {
      Err(AuthorizationError::NotAdmin)
    }
  }

  /// Run the whole state machine for one request.
  pub fn gate<V, F>(
    &self,
    token: Option<&str>,
    verifier: &V,
    lookup: F,
    resource: &ResourceFacts,
    action: Action,
  ) -> Result<Principal>
  where
    V: TokenVerifier + ?Sized,
    F: FnOnce(Uuid) -> Option<Principal>,
  {
    let principal = self.authenticate(token, verifier, lookup)?;
    let Allow = self.authorize_mutation(&principal, resource, action)?;
    Ok(principal)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::{Error, principal::Role};

  /// Tokens are the literal string `"valid:<uuid>"`.
  struct FakeVerifier;

  impl TokenVerifier for FakeVerifier {
    fn verify(&self, token: &str) -> Option<Uuid> {
      token.strip_prefix("valid:")?.parse().ok()
    }
  }

  fn user(id: Uuid) -> Principal {
    Principal { id, role: Role::User, banned: false }
  }

  fn admin(id: Uuid) -> Principal {
    Principal { id, role: Role::Admin, banned: false }
  }

  fn token_for(id: Uuid) -> String { format!("valid:{id}") }

  // ── authenticate ────────────────────────────────────────────────────────

  #[test]
  fn missing_token() {
    let guard = AccessGuard::default();
    let result = guard.authenticate(None, &FakeVerifier, |_| None);
    assert_eq!(result, Err(AuthenticationError::Missing));
  }

  #[test]
  fn invalid_token() {
    let guard = AccessGuard::default();
    let result = guard.authenticate(Some("forged"), &FakeVerifier, |_| None);
    assert_eq!(result, Err(AuthenticationError::Invalid));
  }

  #[test]
  fn unknown_principal() {
    let guard = AccessGuard::default();
    let id = Uuid::new_v4();
    let token = token_for(id);
    let result = guard.authenticate(Some(&token), &FakeVerifier, |_| None);
    assert_eq!(result, Err(AuthenticationError::UnknownPrincipal));
  }

  #[test]
  fn lookup_returning_someone_else_is_unknown() {
    let guard = AccessGuard::default();
    let token = token_for(Uuid::new_v4());
    let other = user(Uuid::new_v4());
    let result =
      guard.authenticate(Some(&token), &FakeVerifier, |_| Some(other));
    assert_eq!(result, Err(AuthenticationError::UnknownPrincipal));
  }

  #[test]
  fn known_principal_is_admitted() {
    let guard = AccessGuard::default();
    let id = Uuid::new_v4();
    let directory: HashMap<Uuid, Principal> = [(id, admin(id))].into();
    let token = token_for(id);
    let principal = guard
      .authenticate(Some(&token), &FakeVerifier, |s| directory.get(&s).copied())
      .unwrap();
    assert_eq!(principal, admin(id));
  }

  #[test]
  fn banned_principal_is_rejected_on_every_request() {
    let guard = AccessGuard::default();
    let id = Uuid::new_v4();
    let banned = Principal { banned: true, ..user(id) };
    let token = token_for(id);
    let result =
      guard.authenticate(Some(&token), &FakeVerifier, |_| Some(banned));
    assert_eq!(result, Err(AuthenticationError::Banned));
  }

  #[test]
  fn login_only_enforcement_lets_tokens_through() {
    let guard = AccessGuard::new(GuardPolicy {
      ban_enforcement: BanEnforcement::LoginOnly,
      ..GuardPolicy::default()
    });
    let id = Uuid::new_v4();
    let banned = Principal { banned: true, ..user(id) };
    let token = token_for(id);

    let admitted = guard
      .authenticate(Some(&token), &FakeVerifier, |_| Some(banned))
      .unwrap();
    assert!(admitted.banned);
    assert_eq!(guard.admit_login(&banned), Err(AuthenticationError::Banned));
  }

  // ── authorize_mutation ──────────────────────────────────────────────────

  #[test]
  fn non_owner_cannot_delete() {
    let guard = AccessGuard::default();
    let p1 = user(Uuid::new_v4());
    let resource = ResourceFacts { author: Uuid::new_v4() };
    assert_eq!(
      guard.authorize_mutation(&p1, &resource, Action::Delete),
      Err(AuthorizationError::NotOwnerOrAdmin)
    );
  }

  #[test]
  fn admin_can_delete_anything() {
    let guard = AccessGuard::default();
    let p1 = admin(Uuid::new_v4());
    let resource = ResourceFacts { author: Uuid::new_v4() };
    assert_eq!(
      guard.authorize_mutation(&p1, &resource, Action::Delete),
      Ok(Allow)
    );
  }

  #[test]
  fn edit_is_allowed_exactly_for_owner_or_admin() {
    let guard = AccessGuard::default();
    let author = Uuid::new_v4();
    let resource = ResourceFacts { author };

    let cases = [
      (user(author), true),
      (admin(author), true),
      (admin(Uuid::new_v4()), true),
      (user(Uuid::new_v4()), false),
    ];
    for (principal, allowed) in cases {
      let result = guard.authorize_mutation(&principal, &resource, Action::Edit);
      if allowed {
        assert_eq!(result, Ok(Allow), "{principal:?}");
      } else {
        assert_eq!(
          result,
          Err(AuthorizationError::NotOwnerOrAdmin),
          "{principal:?}"
        );
      }
    }
  }

  #[test]
  fn anyone_may_vote_including_the_author() {
    let guard = AccessGuard::default();
    let author = Uuid::new_v4();
    let resource = ResourceFacts { author };
    assert_eq!(
      guard.authorize_mutation(&user(author), &resource, Action::Vote),
      Ok(Allow)
    );
    assert_eq!(
      guard.authorize_mutation(&user(Uuid::new_v4()), &resource, Action::Vote),
      Ok(Allow)
    );
  }

  #[test]
  fn self_votes_can_be_forbidden() {
    let guard = AccessGuard::new(GuardPolicy {
      self_votes: SelfVotePolicy::Forbid,
      ..GuardPolicy::default()
    });
    let author = Uuid::new_v4();
    let resource = ResourceFacts { author };
    assert_eq!(
      guard.authorize_mutation(&user(author), &resource, Action::Vote),
      Err(AuthorizationError::SelfVote)
    );
    assert_eq!(
      guard.authorize_mutation(&user(Uuid::new_v4()), &resource, Action::Vote),
      Ok(Allow)
    );
  }

  #[test]
  fn banned_principal_cannot_vote() {
    let guard = AccessGuard::default();
    let banned = Principal { banned: true, ..user(Uuid::new_v4()) };
    let resource = ResourceFacts { author: Uuid::new_v4() };
    assert_eq!(
      guard.authorize_mutation(&banned, &resource, Action::Vote),
      Err(AuthorizationError::Banned)
    );
  }

  #[test]
  fn banned_principal_is_refused_mutations_under_login_only() {
    let guard = AccessGuard::new(GuardPolicy {
      ban_enforcement: BanEnforcement::LoginOnly,
      ..GuardPolicy::default()
    });
    let banned = Principal { banned: true, ..admin(Uuid::new_v4()) };
    let others = ResourceFacts { author: Uuid::new_v4() };
    let own = ResourceFacts { author: banned.id };

    assert_eq!(
      guard.authorize_mutation(&banned, &others, Action::Vote),
      Err(AuthorizationError::Banned)
    );
    for action in [Action::Edit, Action::Delete] {
      assert_eq!(
        guard.authorize_mutation(&banned, &own, action),
        Err(AuthorizationError::Banned),
        "{action}"
      );
    }
    assert_eq!(guard.require_admin(&banned), Err(AuthorizationError::Banned));
  }

  #[test]
  fn admin_operations_need_admin_role() {
    let guard = AccessGuard::default();
    let resource = ResourceFacts { author: Uuid::new_v4() };
    assert_eq!(
      guard.authorize_mutation(
        &user(resource.author),
        &resource,
        Action::AdminOperation
      ),
      Err(AuthorizationError::NotAdmin)
    );
    assert_eq!(guard.require_admin(&admin(Uuid::new_v4())), Ok(Allow));
  }

  // ── gate ────────────────────────────────────────────────────────────────

  #[test]
  fn gate_stops_at_first_failure() {
    let guard = AccessGuard::default();
    let resource = ResourceFacts { author: Uuid::new_v4() };

    let err = guard
      .gate(None, &FakeVerifier, |_| None, &resource, Action::Edit)
      .unwrap_err();
    assert_eq!(err, Error::Authentication(AuthenticationError::Missing));

    let id = Uuid::new_v4();
    let token = token_for(id);
    let err = guard
      .gate(Some(&token), &FakeVerifier, |_| Some(user(id)), &resource, Action::Edit)
      .unwrap_err();
    assert_eq!(
      err,
      Error::Authorization(AuthorizationError::NotOwnerOrAdmin)
    );

    let ok = guard.gate(
      Some(&token),
      &FakeVerifier,
      |_| Some(user(id)),
      &ResourceFacts { author: id },
      Action::Edit,
    );
    assert_eq!(ok, Ok(user(id)));
  }
}
