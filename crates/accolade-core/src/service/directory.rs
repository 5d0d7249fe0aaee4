//! Accounts, roles, permissions, and academic profiles.

use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::info;
use uuid::Uuid;

use super::{ensure_student_visible, find_student, own_lecturer, own_student};
use crate::{
  Error, Result,
  academic::{Lecturer, NewLecturer, NewStudent, Student},
  identity::{NewPermission, NewUser, Permission, Role, User, UserChanges},
  policy::{self, Action, Resource, RoleKind},
  principal::Principal,
  store::DirectoryStore,
};

pub struct Directory<R> {
  directory: Arc<R>,
}

impl<R> Clone for Directory<R> {
  fn clone(&self) -> Self { Self { directory: self.directory.clone() } }
}

impl<R: DirectoryStore> Directory<R> {
  pub fn new(directory: Arc<R>) -> Self { Self { directory } }

  // ─── Bootstrap ─────────────────────────────────────────────────────────────

  /// Create every known role and the permissions the policy grants it.
  /// Safe to run on every start.
  pub async fn seed_access_control(&self) -> Result<()> {
    let store = self.directory.as_ref();
    for kind in RoleKind::iter() {
      let role = match store.get_role_by_name(kind.as_ref()).await.map_err(Error::store)? {
        Some(role) => role,
        None => {
          let role = store
            .create_role(kind.as_ref(), kind.description())
            .await
            .map_err(Error::store)?;
          info!(role = %role.name, "role created");
          role
        }
      };

      for (resource, action) in policy::grants(kind) {
        let name = policy::permission_name(resource, action);
        let permission = match store.get_permission_by_name(&name).await.map_err(Error::store)? {
          Some(p) => p,
          None => store
            .create_permission(NewPermission {
              resource:    resource.to_string(),
              action:      action.to_string(),
              description: format!("{action} {resource}"),
            })
            .await
            .map_err(Error::store)?,
        };
        store
          .grant_permission(role.id, permission.id)
          .await
          .map_err(Error::store)?;
      }
    }
    Ok(())
  }

  /// Create an active administrator account outside the request path.
  pub async fn bootstrap_admin(
    &self,
    username: &str,
    email: &str,
    full_name: &str,
    password_hash: String,
  ) -> Result<User> {
    self.seed_access_control().await?;
    let role = self.role_by_kind(RoleKind::Admin).await?;
    let user = self
      .insert_user(NewUser {
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash,
        full_name: full_name.to_owned(),
        role_id: role.id,
        is_active: true,
      })
      .await?;
    info!(user = %user.id, username = %user.username, "administrator bootstrapped");
    Ok(user)
  }

  // ─── Users ─────────────────────────────────────────────────────────────────

  pub async fn list_users(&self, caller: &Principal) -> Result<Vec<User>> {
    caller.authorize(Resource::User, Action::Read)?;
    self.directory.list_users().await.map_err(Error::store)
  }

  pub async fn get_user(&self, caller: &Principal, id: Uuid) -> Result<User> {
    caller.authorize(Resource::User, Action::Read)?;
    self.find_user(id).await
  }

  pub async fn create_user(&self, caller: &Principal, input: NewUser) -> Result<User> {
    caller.authorize(Resource::User, Action::Create)?;
    self.find_role(input.role_id).await?;
    let user = self.insert_user(input).await?;
    info!(user = %user.id, username = %user.username, "user created");
    Ok(user)
  }

  pub async fn update_user(
    &self,
    caller: &Principal,
    id: Uuid,
    changes: UserChanges,
  ) -> Result<User> {
    caller.authorize(Resource::User, Action::Update)?;
    validate_username(&changes.username)?;

    if let Some(other) = self
      .directory
      .get_user_by_username(&changes.username)
      .await
      .map_err(Error::store)?
      && other.id != id
    {
      return Err(Error::validation(format!(
        "username {:?} is already taken",
        changes.username
      )));
    }

    self
      .directory
      .update_user(id, changes)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("user {id} not found")))
  }

  /// Hard delete. Profile rows go with the user, so a student who still owns
  /// achievement references is refused; deactivate the account instead.
  pub async fn delete_user(&self, caller: &Principal, id: Uuid) -> Result<()> {
    caller.authorize(Resource::User, Action::Delete)?;
    let store = self.directory.as_ref();
    if let Some(student) = store.get_student_by_user(id).await.map_err(Error::store)?
      && store.has_references(student.id).await.map_err(Error::store)?
    {
      return Err(Error::validation(format!(
        "user {id} has achievement records; deactivate the account instead"
      )));
    }
    if !self.directory.delete_user(id).await.map_err(Error::store)? {
      return Err(Error::not_found(format!("user {id} not found")));
    }
    info!(user = %id, "user deleted");
    Ok(())
  }

  pub async fn assign_role(&self, caller: &Principal, id: Uuid, role_id: Uuid) -> Result<User> {
    caller.authorize(Resource::User, Action::AssignRole)?;
    let role = self.find_role(role_id).await?;
    if !self
      .directory
      .set_user_role(id, role.id)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::not_found(format!("user {id} not found")));
    }
    info!(user = %id, role = %role.name, "role assigned");
    self.find_user(id).await
  }

  // ─── Roles and permissions ─────────────────────────────────────────────────

  pub async fn list_roles(&self, caller: &Principal) -> Result<Vec<Role>> {
    caller.authorize(Resource::Role, Action::Read)?;
    self.directory.list_roles().await.map_err(Error::store)
  }

  pub async fn list_permissions(&self, caller: &Principal) -> Result<Vec<Permission>> {
    caller.authorize(Resource::Role, Action::Read)?;
    self.directory.list_permissions().await.map_err(Error::store)
  }

  pub async fn grant_permission(
    &self,
    caller: &Principal,
    role_id: Uuid,
    permission_id: Uuid,
  ) -> Result<()> {
    caller.authorize(Resource::Role, Action::Grant)?;
    let role = self.find_role(role_id).await?;
    let permission = self
      .directory
      .get_permission(permission_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("permission {permission_id} not found")))?;
    self
      .directory
      .grant_permission(role.id, permission.id)
      .await
      .map_err(Error::store)?;
    info!(role = %role.name, permission = %permission.name, "permission granted");
    Ok(())
  }

  pub async fn revoke_permission(
    &self,
    caller: &Principal,
    role_id: Uuid,
    permission_id: Uuid,
  ) -> Result<()> {
    caller.authorize(Resource::Role, Action::Grant)?;
    if !self
      .directory
      .revoke_permission(role_id, permission_id)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::not_found(format!(
        "role {role_id} does not hold permission {permission_id}"
      )));
    }
    info!(role = %role_id, permission = %permission_id, "permission revoked");
    Ok(())
  }

  // ─── Students ──────────────────────────────────────────────────────────────

  /// Admins see every student, advisors their advisees, and students only
  /// themselves.
  pub async fn list_students(&self, caller: &Principal) -> Result<Vec<Student>> {
    let store = self.directory.as_ref();
    match caller.authorize(Resource::Student, Action::Read)? {
      RoleKind::Admin => store.list_students().await.map_err(Error::store),
      RoleKind::Advisor => {
        let lecturer = own_lecturer(store, caller).await?;
        store
          .list_students_by_advisor(lecturer.id)
          .await
          .map_err(Error::store)
      }
      RoleKind::Student => Ok(vec![own_student(store, caller).await?]),
    }
  }

  pub async fn get_student(&self, caller: &Principal, id: Uuid) -> Result<Student> {
    let role = caller.authorize(Resource::Student, Action::Read)?;
    let student = find_student(self.directory.as_ref(), id).await?;
    ensure_student_visible(self.directory.as_ref(), caller, role, &student).await?;
    Ok(student)
  }

  pub async fn create_student(&self, caller: &Principal, input: NewStudent) -> Result<Student> {
    caller.authorize(Resource::Student, Action::Create)?;
    if input.student_number.trim().is_empty() {
      return Err(Error::validation("student_number is required"));
    }
    self.find_user(input.user_id).await?;
    if let Some(advisor_id) = input.advisor_id {
      self.find_lecturer(advisor_id).await?;
    }
    let student = self
      .directory
      .create_student(input)
      .await
      .map_err(Error::store)?;
    info!(student = %student.id, "student profile created");
    Ok(student)
  }

  /// Point a student at a new advisor, or clear it with `None`.
  pub async fn set_advisor(
    &self,
    caller: &Principal,
    student_id: Uuid,
    advisor_id: Option<Uuid>,
  ) -> Result<Student> {
    caller.authorize(Resource::Student, Action::AssignAdvisor)?;
    let store = self.directory.as_ref();
    find_student(store, student_id).await?;
    if let Some(advisor_id) = advisor_id {
      self.find_lecturer(advisor_id).await?;
    }
    if !store
      .set_advisor(student_id, advisor_id)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::not_found(format!("student {student_id} not found")));
    }
    info!(student = %student_id, advisor = ?advisor_id, "advisor assigned");
    find_student(store, student_id).await
  }

  // ─── Lecturers ─────────────────────────────────────────────────────────────

  /// Admins see every lecturer, students their own advisor, and advisors
  /// only themselves.
  pub async fn list_lecturers(&self, caller: &Principal) -> Result<Vec<Lecturer>> {
    let store = self.directory.as_ref();
    match caller.authorize(Resource::Lecturer, Action::Read)? {
      RoleKind::Admin => store.list_lecturers().await.map_err(Error::store),
      RoleKind::Advisor => Ok(vec![own_lecturer(store, caller).await?]),
      RoleKind::Student => {
        let own = own_student(store, caller).await?;
        match own.advisor_id {
          Some(id) => Ok(store.get_lecturer(id).await.map_err(Error::store)?.into_iter().collect()),
          None => Ok(Vec::new()),
        }
      }
    }
  }

  pub async fn get_lecturer(&self, caller: &Principal, id: Uuid) -> Result<Lecturer> {
    let role = caller.authorize(Resource::Lecturer, Action::Read)?;
    let lecturer = self.find_lecturer(id).await?;
    let store = self.directory.as_ref();
    let visible = match role {
      RoleKind::Admin => true,
      RoleKind::Advisor => own_lecturer(store, caller).await?.id == lecturer.id,
      RoleKind::Student => own_student(store, caller).await?.is_advised_by(lecturer.id),
    };
    if visible {
      Ok(lecturer)
    } else {
      Err(Error::forbidden(format!("lecturer {id} is not visible to you")))
    }
  }

  pub async fn create_lecturer(&self, caller: &Principal, input: NewLecturer) -> Result<Lecturer> {
    caller.authorize(Resource::Lecturer, Action::Create)?;
    if input.lecturer_number.trim().is_empty() {
      return Err(Error::validation("lecturer_number is required"));
    }
    self.find_user(input.user_id).await?;
    let lecturer = self
      .directory
      .create_lecturer(input)
      .await
      .map_err(Error::store)?;
    info!(lecturer = %lecturer.id, "lecturer profile created");
    Ok(lecturer)
  }

  /// Students advised by `lecturer_id`. Advisors may only ask about
  /// themselves.
  pub async fn list_advisees(&self, caller: &Principal, lecturer_id: Uuid) -> Result<Vec<Student>> {
    let role = caller.authorize(Resource::Lecturer, Action::ListAdvisees)?;
    let store = self.directory.as_ref();
    let lecturer = self.find_lecturer(lecturer_id).await?;
    if role == RoleKind::Advisor && own_lecturer(store, caller).await?.id != lecturer.id {
      return Err(Error::forbidden("advisors may only list their own advisees"));
    }
    store
      .list_students_by_advisor(lecturer.id)
      .await
      .map_err(Error::store)
  }

  // ─── Helpers ───────────────────────────────────────────────────────────────

  async fn insert_user(&self, input: NewUser) -> Result<User> {
    validate_username(&input.username)?;
    if self
      .directory
      .get_user_by_username(&input.username)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::validation(format!(
        "username {:?} is already taken",
        input.username
      )));
    }
    self.directory.create_user(input).await.map_err(Error::store)
  }

  async fn find_user(&self, id: Uuid) -> Result<User> {
    self
      .directory
      .get_user(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("user {id} not found")))
  }

  async fn find_role(&self, id: Uuid) -> Result<Role> {
    self
      .directory
      .get_role(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("role {id} not found")))
  }

  async fn role_by_kind(&self, kind: RoleKind) -> Result<Role> {
    self
      .directory
      .get_role_by_name(kind.as_ref())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("role {kind} has not been seeded")))
  }

  async fn find_lecturer(&self, id: Uuid) -> Result<Lecturer> {
    self
      .directory
      .get_lecturer(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("lecturer {id} not found")))
  }
}

fn validate_username(username: &str) -> Result<()> {
  if username.trim().is_empty() {
    return Err(Error::validation("username is required"));
  }
  Ok(())
}
