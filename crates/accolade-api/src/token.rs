//! HS256 session tokens.
//!
//! A token carries the caller's user id, role name, and permission names as
//! they were at login or refresh. Validation checks the signature and the
//! expiry only; there is no audience or issuer.

use accolade_core::{Error, principal::Principal};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub user_id:     Uuid,
  pub role:        String,
  pub permissions: Vec<String>,
  pub iat:         i64,
  pub exp:         i64,
}

impl From<Claims> for Principal {
  fn from(c: Claims) -> Self {
    Principal {
      user_id:     c.user_id,
      role:        c.role,
      permissions: c.permissions,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl TokenIssuer {
  pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, Error> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(Error::validation(format!(
        "jwt secret must be at least {MIN_SECRET_LEN} bytes"
      )));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    validation.leeway = 0;

    Ok(Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl,
    })
  }

  pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, Error> {
    self.issue_at(principal, Utc::now())
  }

  fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, Error> {
    let expires_at = now + self.ttl;
    let claims = Claims {
      user_id:     principal.user_id,
      role:        principal.role.clone(),
      permissions: principal.permissions.clone(),
      iat:         now.timestamp(),
      exp:         expires_at.timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(Error::store)?;
    Ok(IssuedToken { token, expires_at })
  }

  /// Decode a bearer token. Any failure is `Unauthorized`.
  pub fn verify(&self, token: &str) -> Result<Principal, Error> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims.into())
      .map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        let reason = match e.kind() {
          ErrorKind::ExpiredSignature => "token expired",
          ErrorKind::InvalidSignature => "invalid token signature",
          _ => "invalid token",
        };
        Error::Unauthorized(reason.to_owned())
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

  fn principal() -> Principal {
    Principal {
      user_id:     Uuid::new_v4(),
      role:        "Student".into(),
      permissions: vec!["achievement:create".into(), "achievement:submit".into()],
    }
  }

  #[test]
  fn short_secret_is_rejected() {
    assert!(TokenIssuer::new(b"too short", Duration::hours(24)).is_err());
  }

  #[test]
  fn issued_token_verifies_to_same_principal() {
    let issuer = TokenIssuer::new(SECRET, Duration::hours(24)).unwrap();
    let p = principal();
    let issued = issuer.issue(&p).unwrap();
    assert_eq!(issuer.verify(&issued.token).unwrap(), p);
  }

  #[test]
  fn expired_token_is_unauthorized() {
    let issuer = TokenIssuer::new(SECRET, Duration::hours(24)).unwrap();
    let issued = issuer
      .issue_at(&principal(), Utc::now() - Duration::hours(25))
      .unwrap();
    let err = issuer.verify(&issued.token).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(ref m) if m == "token expired"));
  }

  #[test]
  fn foreign_secret_is_unauthorized() {
    let ours = TokenIssuer::new(SECRET, Duration::hours(1)).unwrap();
    let theirs = TokenIssuer::new(b"ffffffffffffffffffffffffffffffff", Duration::hours(1)).unwrap();
    let issued = theirs.issue(&principal()).unwrap();
    assert!(matches!(ours.verify(&issued.token), Err(Error::Unauthorized(_))));
    assert!(matches!(ours.verify("not.a.jwt"), Err(Error::Unauthorized(_))));
  }
}
