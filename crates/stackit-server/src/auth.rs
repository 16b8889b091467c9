//! Bearer-token extractors.
//!
//! [`CurrentUser`] runs the access guard's authentication half for a request:
//! token → subject id → fresh user lookup → admitted principal. [`AdminUser`]
//! additionally requires the admin role.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use stackit_core::{
  AuthenticationError,
  guard::Allow,
  principal::{Principal, User},
  store::ForumStore,
};

use crate::{AppState, error::Error};

/// The authenticated caller, re-read from the store on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user:      User,
  pub principal: Principal,
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

/// The token from an `Authorization: Bearer <token>` header.
///
/// No header is `Ok(None)`. A header that is present but not a non-empty
/// bearer credential is [`AuthenticationError::Invalid`]. The scheme name is
/// matched case-insensitively.
pub fn bearer_token(
  headers: &HeaderMap,
) -> Result<Option<&str>, AuthenticationError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| AuthenticationError::Invalid)?;
  let (scheme, token) = value
    .split_once(' ')
    .ok_or(AuthenticationError::Invalid)?;
  let token = token.trim();
  if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
    return Err(AuthenticationError::Invalid);
  }
  Ok(Some(token))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: ForumStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let subject = state.guard.verify(token, state.tokens.as_ref())?;

    let found = state.store.get_user(subject).await.map_err(Error::store)?;
    let principal = state
      .guard
      .admit(subject, found.as_ref().map(User::principal))?;
    let user = found.ok_or(AuthenticationError::UnknownPrincipal)?;

    Ok(CurrentUser { user, principal })
  }
}

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: ForumStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let current = CurrentUser::from_request_parts(parts, state).await?;
    let Allow = state.guard.require_admin(&current.principal)?;
    Ok(AdminUser(current))
  }
}
