//! Users and the principals derived from them.
//!
//! A [`User`] is the stored account. A [`Principal`] is the slice of it the
//! access guard reasons about, fixed for the duration of one request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Privilege level of an account.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id:     Uuid,
  pub role:   Role,
  pub banned: bool,
}

impl Principal {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  /// argon2 PHC string. Never leaves the server.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub banned:        bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl User {
  pub fn principal(&self) -> Principal {
    Principal {
      id:     self.user_id,
      role:   self.role,
      banned: self.banned,
    }
  }
}

/// Input to [`crate::store::ForumStore::create_user`]. New accounts always
/// start as unbanned `user`s.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
}

/// Admin-editable account fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub username: Option<String>,
  pub email:    Option<String>,
  pub role:     Option<Role>,
  pub banned:   Option<bool>,
}
