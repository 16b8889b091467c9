//! Bearer tokens: HS256-signed JWTs carrying the user id and role.

use chrono::{Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use stackit_core::{guard::TokenVerifier, principal::{Role, User}};
use uuid::Uuid;

use crate::error::Result;

/// Payload stored in a bearer token.
///
/// `role` is informational only. The guard always re-reads the user, so a
/// demotion or ban takes effect before the token expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  Uuid,
  pub role: Role,
  /// Issued at (Unix timestamp).
  pub iat:  i64,
  /// Expiration time (Unix timestamp).
  pub exp:  i64,
}

/// Issues and verifies bearer tokens with a shared secret.
pub struct TokenIssuer {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl TokenIssuer {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation: Validation::new(Algorithm::HS256),
      ttl,
    }
  }

  pub fn issue(&self, user: &User) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub:  user.user_id,
      role: user.role,
      iat:  now.timestamp(),
      exp:  (now + self.ttl).timestamp(),
    };
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  /// Decode and check signature and expiry. `None` for any failure.
  pub fn decode(&self, token: &str) -> Option<Claims> {
    match decode::<Claims>(token, &self.decoding, &self.validation) {
      Ok(data) => Some(data.claims),
      Err(err) => {
        tracing::debug!(error = %err, "bearer token rejected");
        None
      }
    }
  }
}

impl TokenVerifier for TokenIssuer {
  fn verify(&self, token: &str) -> Option<Uuid> {
    self.decode(token).map(|claims| claims.sub)
  }
}
