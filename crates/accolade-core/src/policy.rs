//! Declarative access policy.
//!
//! Every operation names a `(resource, action)` pair and is checked against
//! [`RULES`] once, before any ownership check. The same table seeds the
//! default `resource:action` permissions granted to each role.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

/// The roles the policy knows about. Role names are matched
/// case-insensitively; any other role is denied everything.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum RoleKind {
  Admin,
  Student,
  Advisor,
}

impl RoleKind {
  pub fn description(self) -> &'static str {
    match self {
      Self::Admin => "Manages users, roles, and every achievement",
      Self::Student => "Reports their own achievements",
      Self::Advisor => "Verifies or rejects their advisees' achievements",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
  Achievement,
  User,
  Role,
  Student,
  Lecturer,
  Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Create,
  Read,
  Update,
  Delete,
  Submit,
  Verify,
  Reject,
  Attach,
  AssignRole,
  AssignAdvisor,
  ListAdvisees,
  Grant,
  Overview,
  Audit,
}

use Action as A;
use Resource as R;
use RoleKind::{Admin, Advisor, Student};

/// Allowed `(role, resource, action)` triples. Anything absent is denied.
pub const RULES: &[(RoleKind, Resource, Action)] = &[
  // ── Achievements ────────────────────────────────────────────────────────
  (Admin, R::Achievement, A::Create),
  (Admin, R::Achievement, A::Read),
  (Admin, R::Achievement, A::Update),
  (Admin, R::Achievement, A::Delete),
  (Admin, R::Achievement, A::Attach),
  (Student, R::Achievement, A::Create),
  (Student, R::Achievement, A::Read),
  (Student, R::Achievement, A::Update),
  (Student, R::Achievement, A::Delete),
  (Student, R::Achievement, A::Submit),
  (Student, R::Achievement, A::Attach),
  (Advisor, R::Achievement, A::Read),
  (Advisor, R::Achievement, A::Verify),
  (Advisor, R::Achievement, A::Reject),
  // ── Accounts ────────────────────────────────────────────────────────────
  (Admin, R::User, A::Create),
  (Admin, R::User, A::Read),
  (Admin, R::User, A::Update),
  (Admin, R::User, A::Delete),
  (Admin, R::User, A::AssignRole),
  (Admin, R::Role, A::Read),
  (Admin, R::Role, A::Grant),
  // ── Profiles ────────────────────────────────────────────────────────────
  (Admin, R::Student, A::Create),
  (Admin, R::Student, A::Read),
  (Admin, R::Student, A::AssignAdvisor),
  (Student, R::Student, A::Read),
  (Advisor, R::Student, A::Read),
  (Admin, R::Lecturer, A::Create),
  (Admin, R::Lecturer, A::Read),
  (Admin, R::Lecturer, A::ListAdvisees),
  (Student, R::Lecturer, A::Read),
  (Advisor, R::Lecturer, A::Read),
  (Advisor, R::Lecturer, A::ListAdvisees),
  // ── Reports ─────────────────────────────────────────────────────────────
  (Admin, R::Report, A::Overview),
  (Admin, R::Report, A::Audit),
  (Admin, R::Report, A::Read),
  (Student, R::Report, A::Read),
  (Advisor, R::Report, A::Read),
];

pub fn allows(role: RoleKind, resource: Resource, action: Action) -> bool {
  RULES
    .iter()
    .any(|&(r, res, act)| r == role && res == resource && act == action)
}

/// Check a role name against the table, returning the parsed role.
pub fn authorize(role_name: &str, resource: Resource, action: Action) -> Result<RoleKind> {
  let role: RoleKind = role_name
    .parse()
    .map_err(|_| Error::forbidden(format!("role {role_name:?} is not recognised")))?;

  if allows(role, resource, action) {
    Ok(role)
  } else {
    Err(Error::forbidden(format!("{role} may not {action} {resource}")))
  }
}

/// The `resource:action` permission name for a rule.
pub fn permission_name(resource: Resource, action: Action) -> String {
  format!("{resource}:{action}")
}

/// Every `(resource, action)` pair the table grants to `role`.
pub fn grants(role: RoleKind) -> impl Iterator<Item = (Resource, Action)> {
  RULES
    .iter()
    .filter(move |(r, ..)| *r == role)
    .map(|&(_, res, act)| (res, act))
}
