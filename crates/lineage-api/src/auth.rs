//! Shared-secret verification for `POST /login`.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::error::ApiError;

/// The process-wide secret every user logs in with.
#[derive(Clone)]
pub struct SecretConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub private_key_hash: String,
}

/// Check a presented private key against the configured hash.
pub fn verify_secret(private_key: &str, config: &SecretConfig) -> Result<(), ApiError> {
  let parsed_hash = PasswordHash::new(&config.private_key_hash)
    .map_err(|_| ApiError::Unauthorized("server secret is misconfigured".into()))?;

  Argon2::default()
    .verify_password(private_key.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized("invalid private key".into()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  fn config(secret: &str) -> SecretConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .unwrap()
      .to_string();
    SecretConfig { private_key_hash: hash }
  }

  #[test]
  fn correct_secret() {
    assert!(verify_secret("family", &config("family")).is_ok());
  }

  #[test]
  fn wrong_secret() {
    assert!(matches!(
      verify_secret("guess", &config("family")),
      Err(ApiError::Unauthorized(_))
    ));
  }

  #[test]
  fn malformed_hash_never_verifies() {
    let cfg = SecretConfig { private_key_hash: "plaintext".into() };
    assert!(matches!(verify_secret("plaintext", &cfg), Err(ApiError::Unauthorized(_))));
  }
}
