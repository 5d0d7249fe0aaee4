//! Conversions between domain types and the plain-text values stored in
//! SQLite columns.
//!
//! Timestamps are RFC 3339 strings in UTC, UUIDs hyphenated lowercase strings, and
//! statuses their lowercase names.

use accolade_core::{
  academic::{Lecturer, Student},
  achievement::{AchievementReference, AchievementStatus},
  identity::{Permission, Role, User},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

/// Fixed-width so that text ordering matches time ordering.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn decode_status(s: &str) -> Result<AchievementStatus> {
  s.parse().map_err(|_| Error::Status(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role_id, is_active, \
                                created_at, updated_at";

pub struct RawUser {
  pub id:            String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub full_name:     String,
  pub role_id:       String,
  pub is_active:     bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      full_name:     row.get(4)?,
      role_id:       row.get(5)?,
      is_active:     row.get(6)?,
      created_at:    row.get(7)?,
      updated_at:    row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      full_name:     self.full_name,
      role_id:       decode_uuid(&self.role_id)?,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawRole {
  pub id:          String,
  pub name:        String,
  pub description: String,
  pub created_at:  String,
}

impl RawRole {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_role(self) -> Result<Role> {
    Ok(Role {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawPermission {
  pub id:          String,
  pub name:        String,
  pub resource:    String,
  pub action:      String,
  pub description: String,
}

impl RawPermission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      resource:    row.get(2)?,
      action:      row.get(3)?,
      description: row.get(4)?,
    })
  }

  pub fn into_permission(self) -> Result<Permission> {
    Ok(Permission {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      resource:    self.resource,
      action:      self.action,
      description: self.description,
    })
  }
}

pub const STUDENT_COLUMNS: &str =
  "id, user_id, student_number, program, academic_year, advisor_id, created_at";

pub struct RawStudent {
  pub id:             String,
  pub user_id:        String,
  pub student_number: String,
  pub program:        String,
  pub academic_year:  String,
  pub advisor_id:     Option<String>,
  pub created_at:     String,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      user_id:        row.get(1)?,
      student_number: row.get(2)?,
      program:        row.get(3)?,
      academic_year:  row.get(4)?,
      advisor_id:     row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      id:             decode_uuid(&self.id)?,
      user_id:        decode_uuid(&self.user_id)?,
      student_number: self.student_number,
      program:        self.program,
      academic_year:  self.academic_year,
      advisor_id:     decode_opt_uuid(self.advisor_id)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const LECTURER_COLUMNS: &str = "id, user_id, lecturer_number, department, created_at";

pub struct RawLecturer {
  pub id:              String,
  pub user_id:         String,
  pub lecturer_number: String,
  pub department:      String,
  pub created_at:      String,
}

impl RawLecturer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      user_id:         row.get(1)?,
      lecturer_number: row.get(2)?,
      department:      row.get(3)?,
      created_at:      row.get(4)?,
    })
  }

  pub fn into_lecturer(self) -> Result<Lecturer> {
    Ok(Lecturer {
      id:              decode_uuid(&self.id)?,
      user_id:         decode_uuid(&self.user_id)?,
      lecturer_number: self.lecturer_number,
      department:      self.department,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const REFERENCE_COLUMNS: &str = "r.id, r.student_id, r.document_id, r.status, r.submitted_at, \
                                     r.verified_at, r.verified_by, r.rejection_note, \
                                     r.created_at, r.updated_at";

pub struct RawReference {
  pub id:             String,
  pub student_id:     String,
  pub document_id:    String,
  pub status:         String,
  pub submitted_at:   Option<String>,
  pub verified_at:    Option<String>,
  pub verified_by:    Option<String>,
  pub rejection_note: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawReference {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      student_id:     row.get(1)?,
      document_id:    row.get(2)?,
      status:         row.get(3)?,
      submitted_at:   row.get(4)?,
      verified_at:    row.get(5)?,
      verified_by:    row.get(6)?,
      rejection_note: row.get(7)?,
      created_at:     row.get(8)?,
      updated_at:     row.get(9)?,
    })
  }

  pub fn into_reference(self) -> Result<AchievementReference> {
    Ok(AchievementReference {
      id:             decode_uuid(&self.id)?,
      student_id:     decode_uuid(&self.student_id)?,
      document_id:    decode_uuid(&self.document_id)?,
      status:         decode_status(&self.status)?,
      submitted_at:   decode_opt_dt(self.submitted_at)?,
      verified_at:    decode_opt_dt(self.verified_at)?,
      verified_by:    decode_opt_uuid(self.verified_by)?,
      rejection_note: self.rejection_note,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}
