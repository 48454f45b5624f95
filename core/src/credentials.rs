// core/src/credentials.rs

//! Password hashing and verification with Argon2.

use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    SaltString,
  },
  Argon2,
};
use tracing::{debug, error, instrument};

use crate::error::StoreError;

/// Hashes a plain-text password into an Argon2 PHC string.
///
/// An empty password is a validation error; a hashing failure is internal.
#[instrument(name = "credentials::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, StoreError> {
  if password.is_empty() {
    return Err(StoreError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(StoreError::Internal(format!("Password hashing failed: {}", argon_err)))
    }
  }
}

/// Checks `provided_password` against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch. A stored hash that cannot be parsed is an
/// internal error, since it means the account record itself is damaged.
#[instrument(
  name = "credentials::verify_password",
  skip(stored_hash, provided_password),
  err(Display),
  fields(hash_len = stored_hash.len())
)]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, StoreError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    StoreError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification encountered an error.");
      Err(StoreError::Internal(format!("Password verification failed: {}", other)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("s3cretpass").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "s3cretpass").unwrap());
    assert!(!verify_password(&hash, "wrongpass1").unwrap());
    assert!(!verify_password(&hash, "").unwrap());
  }

  #[test]
  fn empty_password_is_rejected() {
    assert!(matches!(hash_password(""), Err(StoreError::Validation(_))));
  }

  #[test]
  fn damaged_hash_is_internal() {
    assert!(matches!(
      verify_password("not-a-phc-string", "whatever1"),
      Err(StoreError::Internal(_))
    ));
  }
}
