//! Accounts and role-based access records held in the relational store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── User ────────────────────────────────────────────────────────────────────

/// A login account. The password hash is never serialised.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub id:            Uuid,
  pub username:      String,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub full_name:     String,
  pub role_id:       Uuid,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::create_user`]. The id and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  /// PHC string, already hashed by the caller.
  pub password_hash: String,
  pub full_name:     String,
  pub role_id:       Uuid,
  pub is_active:     bool,
}

/// Replacement values for every user field except the role.
#[derive(Debug, Clone)]
pub struct UserChanges {
  pub username:      String,
  pub email:         String,
  pub full_name:     String,
  pub is_active:     bool,
  /// `Some` only when the password is being changed.
  pub password_hash: Option<String>,
}

// ─── Roles and permissions ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

/// A named grant of the form `resource:action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
  pub id:          Uuid,
  pub name:        String,
  pub resource:    String,
  pub action:      String,
  pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
  pub resource:    String,
  pub action:      String,
  pub description: String,
}

impl NewPermission {
  /// The unique permission name derived from resource and action.
  pub fn name(&self) -> String { format!("{}:{}", self.resource, self.action) }
}
