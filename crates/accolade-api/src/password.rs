//! argon2 password hashing.

use accolade_core::Error;
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

/// Hash `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
  if password.is_empty() {
    return Err(Error::validation("password is required"));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::validation(format!("password could not be hashed: {e}")))
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, Error> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(Error::store)?
}

/// `false` for a wrong password or an unparseable stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
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
    let hash = hash_password("correct horse").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("battery staple", &hash));
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn empty_password_is_rejected() {
    assert!(matches!(hash_password(""), Err(Error::Validation(_))));
  }
}
