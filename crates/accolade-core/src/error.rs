//! Error types for `accolade-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::achievement::AchievementStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Validation(String),

  #[error("achievement {id} is {status}; expected {expected}")]
  InvalidState {
    id:       Uuid,
    status:   AchievementStatus,
    expected: &'static str,
  },

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

  pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
