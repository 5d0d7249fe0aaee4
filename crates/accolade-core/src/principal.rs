//! The authenticated caller, as decoded from a session token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  policy::{self, Action, Resource, RoleKind},
};

/// Who is making a request. The role and permissions are the values embedded
/// in the token at login or refresh; they are not re-read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id:     Uuid,
  pub role:        String,
  pub permissions: Vec<String>,
}

impl Principal {
  /// Evaluate the policy table for this caller's role.
  pub fn authorize(&self, resource: Resource, action: Action) -> Result<RoleKind> {
    policy::authorize(&self.role, resource, action)
  }
}
