//! argon2 password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::{Error, Result};

/// Hash `password` into a PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// `false` for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("hunter22").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter22", &hash));
    assert!(!verify_password("hunter23", &hash));
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }
}
