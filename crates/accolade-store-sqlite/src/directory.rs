//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use accolade_core::{
  academic::{Lecturer, NewLecturer, NewStudent, Student},
  achievement::{AchievementReference, AchievementStatus, StatusCount},
  identity::{NewPermission, NewUser, Permission, Role, User, UserChanges},
  store::{DirectoryStore, ReferenceScope},
};

use crate::{
  Result,
  encode::{
    LECTURER_COLUMNS, REFERENCE_COLUMNS, RawLecturer, RawPermission, RawReference, RawRole,
    RawStudent, RawUser, STUDENT_COLUMNS, USER_COLUMNS, decode_status, encode_dt, encode_uuid,
  },
  schema::DIRECTORY_SCHEMA,
};

const ROLE_COLUMNS: &str = "id, name, description, created_at";
const PERMISSION_COLUMNS: &str = "id, name, resource, action, description";

// ─── Store ───────────────────────────────────────────────────────────────────

/// The relational store backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`. Lock waits give up after
  /// `busy_timeout`.
  pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(Duration::from_secs(5)).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(DIRECTORY_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a statement that binds only string parameters. Returns the number
  /// of rows changed.
  async fn execute(&self, sql: &'static str, params: Vec<Option<String>>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(changed)
  }

  async fn query_opt<T, F>(&self, sql: String, key: String, map: F) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, rusqlite::params![key], map).optional()?))
      .await?;
    Ok(row)
  }

  async fn query_all<T, F>(&self, sql: String, params: Vec<String>, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      id:            Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      full_name:     input.full_name,
      role_id:       input.role_id,
      is_active:     input.is_active,
      created_at:    now,
      updated_at:    now,
    };

    let id = encode_uuid(user.id);
    let username = user.username.clone();
    let email = user.email.clone();
    let hash = user.password_hash.clone();
    let full_name = user.full_name.clone();
    let role_id = encode_uuid(user.role_id);
    let is_active = user.is_active;
    let at = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             id, username, email, password_hash, full_name, role_id, is_active,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![id, username, email, hash, full_name, role_id, is_active, at],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self
      .query_opt(
        format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        encode_uuid(id),
        RawUser::from_row,
      )
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn get_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    self
      .query_opt(
        format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        username.to_owned(),
        RawUser::from_row,
      )
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    self
      .query_all(
        format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"),
        Vec::new(),
        RawUser::from_row,
      )
      .await?
      .into_iter()
      .map(RawUser::into_user)
      .collect()
  }

  async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let at = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET
             username      = ?2,
             email         = ?3,
             full_name     = ?4,
             is_active     = ?5,
             password_hash = COALESCE(?6, password_hash),
             updated_at    = ?7
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            changes.username,
            changes.email,
            changes.full_name,
            changes.is_active,
            changes.password_hash,
            at,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let n = self
      .execute("DELETE FROM users WHERE id = ?1", vec![Some(encode_uuid(id))])
      .await?;
    Ok(n > 0)
  }

  async fn set_user_role(&self, id: Uuid, role_id: Uuid) -> Result<bool> {
    let n = self
      .execute(
        "UPDATE users SET role_id = ?2, updated_at = ?3 WHERE id = ?1",
        vec![
          Some(encode_uuid(id)),
          Some(encode_uuid(role_id)),
          Some(encode_dt(Utc::now())),
        ],
      )
      .await?;
    Ok(n > 0)
  }

  // ── Roles and permissions ─────────────────────────────────────────────────

  async fn create_role<'a>(&'a self, name: &'a str, description: &'a str) -> Result<Role> {
    let role = Role {
      id:          Uuid::new_v4(),
      name:        name.to_owned(),
      description: description.to_owned(),
      created_at:  Utc::now(),
    };
    self
      .execute(
        "INSERT INTO roles (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        vec![
          Some(encode_uuid(role.id)),
          Some(role.name.clone()),
          Some(role.description.clone()),
          Some(encode_dt(role.created_at)),
        ],
      )
      .await?;
    Ok(role)
  }

  async fn get_role(&self, id: Uuid) -> Result<Option<Role>> {
    self
      .query_opt(
        format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?1"),
        encode_uuid(id),
        RawRole::from_row,
      )
      .await?
      .map(RawRole::into_role)
      .transpose()
  }

  async fn get_role_by_name<'a>(&'a self, name: &'a str) -> Result<Option<Role>> {
    self
      .query_opt(
        format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = ?1"),
        name.to_owned(),
        RawRole::from_row,
      )
      .await?
      .map(RawRole::into_role)
      .transpose()
  }

  async fn list_roles(&self) -> Result<Vec<Role>> {
    self
      .query_all(
        format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY name"),
        Vec::new(),
        RawRole::from_row,
      )
      .await?
      .into_iter()
      .map(RawRole::into_role)
      .collect()
  }

  async fn create_permission(&self, input: NewPermission) -> Result<Permission> {
    let permission = Permission {
      id:          Uuid::new_v4(),
      name:        input.name(),
      resource:    input.resource,
      action:      input.action,
      description: input.description,
    };
    self
      .execute(
        "INSERT INTO permissions (id, name, resource, action, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Some(encode_uuid(permission.id)),
          Some(permission.name.clone()),
          Some(permission.resource.clone()),
          Some(permission.action.clone()),
          Some(permission.description.clone()),
        ],
      )
      .await?;
    Ok(permission)
  }

  async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>> {
    self
      .query_opt(
        format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = ?1"),
        encode_uuid(id),
        RawPermission::from_row,
      )
      .await?
      .map(RawPermission::into_permission)
      .transpose()
  }

  async fn get_permission_by_name<'a>(&'a self, name: &'a str) -> Result<Option<Permission>> {
    self
      .query_opt(
        format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE name = ?1"),
        name.to_owned(),
        RawPermission::from_row,
      )
      .await?
      .map(RawPermission::into_permission)
      .transpose()
  }

  async fn list_permissions(&self) -> Result<Vec<Permission>> {
    self
      .query_all(
        format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY name"),
        Vec::new(),
        RawPermission::from_row,
      )
      .await?
      .into_iter()
      .map(RawPermission::into_permission)
      .collect()
  }

  async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
    self
      .execute(
        "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)",
        vec![Some(encode_uuid(role_id)), Some(encode_uuid(permission_id))],
      )
      .await?;
    Ok(())
  }

  async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> Result<bool> {
    let n = self
      .execute(
        "DELETE FROM role_permissions WHERE role_id = ?1 AND permission_id = ?2",
        vec![Some(encode_uuid(role_id)), Some(encode_uuid(permission_id))],
      )
      .await?;
    Ok(n > 0)
  }

  async fn permission_names_for_role(&self, role_id: Uuid) -> Result<Vec<String>> {
    self
      .query_all(
        "SELECT p.name FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id
         WHERE rp.role_id = ?1
         ORDER BY p.name"
          .to_owned(),
        vec![encode_uuid(role_id)],
        |row| row.get(0),
      )
      .await
  }

  // ── Students and lecturers ────────────────────────────────────────────────

  async fn create_student(&self, input: NewStudent) -> Result<Student> {
    let student = Student {
      id:             Uuid::new_v4(),
      user_id:        input.user_id,
      student_number: input.student_number,
      program:        input.program,
      academic_year:  input.academic_year,
      advisor_id:     input.advisor_id,
      created_at:     Utc::now(),
    };
    self
      .execute(
        "INSERT INTO students (
           id, user_id, student_number, program, academic_year, advisor_id, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        vec![
          Some(encode_uuid(student.id)),
          Some(encode_uuid(student.user_id)),
          Some(student.student_number.clone()),
          Some(student.program.clone()),
          Some(student.academic_year.clone()),
          student.advisor_id.map(encode_uuid),
          Some(encode_dt(student.created_at)),
        ],
      )
      .await?;
    Ok(student)
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self
      .query_opt(
        format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
        encode_uuid(id),
        RawStudent::from_row,
      )
      .await?
      .map(RawStudent::into_student)
      .transpose()
  }

  async fn get_student_by_user(&self, user_id: Uuid) -> Result<Option<Student>> {
    self
      .query_opt(
        format!("SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = ?1"),
        encode_uuid(user_id),
        RawStudent::from_row,
      )
      .await?
      .map(RawStudent::into_student)
      .transpose()
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    self
      .query_all(
        format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY student_number"),
        Vec::new(),
        RawStudent::from_row,
      )
      .await?
      .into_iter()
      .map(RawStudent::into_student)
      .collect()
  }

  async fn list_students_by_advisor(&self, lecturer_id: Uuid) -> Result<Vec<Student>> {
    self
      .query_all(
        format!(
          "SELECT {STUDENT_COLUMNS} FROM students WHERE advisor_id = ?1 ORDER BY student_number"
        ),
        vec![encode_uuid(lecturer_id)],
        RawStudent::from_row,
      )
      .await?
      .into_iter()
      .map(RawStudent::into_student)
      .collect()
  }

  async fn set_advisor(&self, student_id: Uuid, advisor_id: Option<Uuid>) -> Result<bool> {
    let n = self
      .execute(
        "UPDATE students SET advisor_id = ?2 WHERE id = ?1",
        vec![Some(encode_uuid(student_id)), advisor_id.map(encode_uuid)],
      )
      .await?;
    Ok(n > 0)
  }

  async fn create_lecturer(&self, input: NewLecturer) -> Result<Lecturer> {
    let lecturer = Lecturer {
      id:              Uuid::new_v4(),
      user_id:         input.user_id,
      lecturer_number: input.lecturer_number,
      department:      input.department,
      created_at:      Utc::now(),
    };
    self
      .execute(
        "INSERT INTO lecturers (id, user_id, lecturer_number, department, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          Some(encode_uuid(lecturer.id)),
          Some(encode_uuid(lecturer.user_id)),
          Some(lecturer.lecturer_number.clone()),
          Some(lecturer.department.clone()),
          Some(encode_dt(lecturer.created_at)),
        ],
      )
      .await?;
    Ok(lecturer)
  }

  async fn get_lecturer(&self, id: Uuid) -> Result<Option<Lecturer>> {
    self
      .query_opt(
        format!("SELECT {LECTURER_COLUMNS} FROM lecturers WHERE id = ?1"),
        encode_uuid(id),
        RawLecturer::from_row,
      )
      .await?
      .map(RawLecturer::into_lecturer)
      .transpose()
  }

  async fn get_lecturer_by_user(&self, user_id: Uuid) -> Result<Option<Lecturer>> {
    self
      .query_opt(
        format!("SELECT {LECTURER_COLUMNS} FROM lecturers WHERE user_id = ?1"),
        encode_uuid(user_id),
        RawLecturer::from_row,
      )
      .await?
      .map(RawLecturer::into_lecturer)
      .transpose()
  }

  async fn list_lecturers(&self) -> Result<Vec<Lecturer>> {
    self
      .query_all(
        format!("SELECT {LECTURER_COLUMNS} FROM lecturers ORDER BY lecturer_number"),
        Vec::new(),
        RawLecturer::from_row,
      )
      .await?
      .into_iter()
      .map(RawLecturer::into_lecturer)
      .collect()
  }

  // ── Achievement references ────────────────────────────────────────────────

  async fn insert_reference(&self, reference: AchievementReference) -> Result<()> {
    self
      .execute(
        "INSERT INTO achievement_references (
           id, student_id, document_id, status, submitted_at, verified_at,
           verified_by, rejection_note, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        vec![
          Some(encode_uuid(reference.id)),
          Some(encode_uuid(reference.student_id)),
          Some(encode_uuid(reference.document_id)),
          Some(reference.status.as_ref().to_owned()),
          reference.submitted_at.map(encode_dt),
          reference.verified_at.map(encode_dt),
          reference.verified_by.map(encode_uuid),
          reference.rejection_note,
          Some(encode_dt(reference.created_at)),
          Some(encode_dt(reference.updated_at)),
        ],
      )
      .await?;
    Ok(())
  }

  async fn get_reference(&self, id: Uuid) -> Result<Option<AchievementReference>> {
    self
      .query_opt(
        format!("SELECT {REFERENCE_COLUMNS} FROM achievement_references r WHERE r.id = ?1"),
        encode_uuid(id),
        RawReference::from_row,
      )
      .await?
      .map(RawReference::into_reference)
      .transpose()
  }

  async fn list_references(
    &self,
    scope: ReferenceScope,
    status: Option<AchievementStatus>,
  ) -> Result<Vec<AchievementReference>> {
    let mut sql = format!("SELECT {REFERENCE_COLUMNS} FROM achievement_references r");
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    match scope {
      ReferenceScope::All => {}
      ReferenceScope::Student(student_id) => {
        params.push(encode_uuid(student_id));
        clauses.push(format!("r.student_id = ?{}", params.len()));
        clauses.push("r.status != 'deleted'".to_owned());
      }
      ReferenceScope::Advisor(lecturer_id) => {
        sql.push_str(" JOIN students s ON s.id = r.student_id");
        params.push(encode_uuid(lecturer_id));
        clauses.push(format!("s.advisor_id = ?{}", params.len()));
        clauses.push("r.status != 'deleted'".to_owned());
      }
    }
    if let Some(status) = status {
      params.push(status.as_ref().to_owned());
      clauses.push(format!("r.status = ?{}", params.len()));
    }

    if !clauses.is_empty() {
      sql.push_str(" WHERE ");
      sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY r.created_at DESC, r.rowid DESC");

    self
      .query_all(sql, params, RawReference::from_row)
      .await?
      .into_iter()
      .map(RawReference::into_reference)
      .collect()
  }

  async fn has_references(&self, student_id: Uuid) -> Result<bool> {
    let found = self
      .query_opt(
        "SELECT 1 FROM achievement_references WHERE student_id = ?1 LIMIT 1".to_owned(),
        encode_uuid(student_id),
        |row| row.get::<_, i64>(0),
      )
      .await?;
    Ok(found.is_some())
  }

  async fn update_reference(&self, reference: AchievementReference) -> Result<bool> {
    let n = self
      .execute(
        "UPDATE achievement_references SET
           status         = ?2,
           submitted_at   = ?3,
           verified_at    = ?4,
           verified_by    = ?5,
           rejection_note = ?6,
           updated_at     = ?7
         WHERE id = ?1",
        vec![
          Some(encode_uuid(reference.id)),
          Some(reference.status.as_ref().to_owned()),
          reference.submitted_at.map(encode_dt),
          reference.verified_at.map(encode_dt),
          reference.verified_by.map(encode_uuid),
          reference.rejection_note,
          Some(encode_dt(reference.updated_at)),
        ],
      )
      .await?;
    Ok(n > 0)
  }

  async fn count_by_status(&self, student_id: Option<Uuid>) -> Result<Vec<StatusCount>> {
    let (sql, params) = match student_id {
      Some(id) => (
        "SELECT status, COUNT(*) FROM achievement_references
         WHERE status != 'deleted' AND student_id = ?1
         GROUP BY status ORDER BY status",
        vec![encode_uuid(id)],
      ),
      None => (
        "SELECT status, COUNT(*) FROM achievement_references
         WHERE status != 'deleted'
         GROUP BY status ORDER BY status",
        Vec::new(),
      ),
    };

    self
      .query_all(sql.to_owned(), params, |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
      })
      .await?
      .into_iter()
      .map(|(status, total)| {
        Ok(StatusCount {
          status: decode_status(&status)?,
          total:  total.max(0) as u64,
        })
      })
      .collect()
  }
}
