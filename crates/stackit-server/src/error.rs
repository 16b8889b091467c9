//! Error types and axum `IntoResponse` implementation.
//!
//! Every error renders as a JSON body `{"message": ...}`; validation failures
//! add a `details` array with one entry per violated rule.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use stackit_core::{
  AuthenticationError, AuthorizationError, InvalidVoteType, store::Conflict,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  BadRequest(String),

  #[error("validation error")]
  Validation(Vec<String>),

  #[error(transparent)]
  InvalidVoteType(#[from] InvalidVoteType),

  #[error(transparent)]
  Authentication(#[from] AuthenticationError),

  #[error(transparent)]
  Authorization(#[from] AuthorizationError),

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("{0}")]
  Conflict(String),

  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::BadRequest(_) | Error::Validation(_) | Error::InvalidVoteType(_) => {
        StatusCode::BAD_REQUEST
      }
      Error::Authentication(AuthenticationError::Banned) => StatusCode::FORBIDDEN,
      Error::Authentication(_) => StatusCode::UNAUTHORIZED,
      Error::Authorization(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::Token(_) | Error::PasswordHash(_) | Error::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<stackit_core::Error> for Error {
  fn from(err: stackit_core::Error) -> Self {
    match err {
      stackit_core::Error::InvalidVoteType(e) => e.into(),
      stackit_core::Error::Authentication(e) => e.into(),
      stackit_core::Error::Authorization(e) => e.into(),
    }
  }
}

impl From<Conflict> for Error {
  fn from(conflict: Conflict) -> Self {
    match conflict {
      Conflict::Version { current } => Error::Conflict(format!(
        "resource was modified concurrently (now at version {current})"
      )),
      Conflict::Duplicate { field } => {
        Error::Conflict(format!("{field} already in use"))
      }
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    let body = match &self {
      Error::Validation(details) => {
        json!({ "message": self.to_string(), "details": details })
      }
      _ if status.is_server_error() => {
        tracing::error!(error = %self, "request failed");
        json!({ "message": "internal server error" })
      }
      Error::Authentication(_) | Error::Authorization(_) => {
        tracing::warn!(error = %self, "request denied");
        json!({ "message": self.to_string() })
      }
      _ => json!({ "message": self.to_string() }),
    };

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
