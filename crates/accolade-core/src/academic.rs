//! Student and lecturer profiles. Each is owned by exactly one [`User`].
//!
//! [`User`]: crate::identity::User

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:             Uuid,
  pub user_id:        Uuid,
  pub student_number: String,
  pub program:        String,
  pub academic_year:  String,
  /// The lecturer assigned as this student's advisor, if any.
  pub advisor_id:     Option<Uuid>,
  pub created_at:     DateTime<Utc>,
}

impl Student {
  pub fn is_advised_by(&self, lecturer_id: Uuid) -> bool {
    self.advisor_id == Some(lecturer_id)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub user_id:        Uuid,
  pub student_number: String,
  pub program:        String,
  pub academic_year:  String,
  #[serde(default)]
  pub advisor_id:     Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecturer {
  pub id:              Uuid,
  pub user_id:         Uuid,
  pub lecturer_number: String,
  pub department:      String,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLecturer {
  pub user_id:         Uuid,
  pub lecturer_number: String,
  pub department:      String,
}
