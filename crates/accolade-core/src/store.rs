//! Storage traits.
//!
//! The relational side ([`DirectoryStore`]) and the document side
//! ([`DocumentStore`]) are separate abstractions with separate connections.
//! Nothing spans both: a service that writes to each does so with two
//! independent calls.

use std::future::Future;

use uuid::Uuid;

use crate::{
  academic::{Lecturer, NewLecturer, NewStudent, Student},
  achievement::{AchievementDocument, AchievementReference, AchievementStatus, StatusCount},
  identity::{NewPermission, NewUser, Permission, Role, User, UserChanges},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which references [`DirectoryStore::list_references`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope {
  /// Every reference, including soft-deleted ones.
  All,
  /// Non-deleted references owned by one student.
  Student(Uuid),
  /// Non-deleted references of every student advised by one lecturer.
  Advisor(Uuid),
}

// ─── Relational store ────────────────────────────────────────────────────────

/// Users, roles, permissions, profiles, and achievement references.
///
/// Lookups return `None` for unknown ids; mutations of a single row return
/// `false` when the row does not exist.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Overwrite every field except the role. Returns the updated row.
  fn update_user(
    &self,
    id: Uuid,
    changes: UserChanges,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Hard delete.
  fn delete_user(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_user_role(
    &self,
    id: Uuid,
    role_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Roles and permissions ─────────────────────────────────────────────

  fn create_role<'a>(
    &'a self,
    name: &'a str,
    description: &'a str,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + 'a;

  fn get_role(&self, id: Uuid)
  -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  fn get_role_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + 'a;

  fn list_roles(&self) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;

  fn create_permission(
    &self,
    input: NewPermission,
  ) -> impl Future<Output = Result<Permission, Self::Error>> + Send + '_;

  fn get_permission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Permission>, Self::Error>> + Send + '_;

  fn get_permission_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Permission>, Self::Error>> + Send + 'a;

  fn list_permissions(
    &self,
  ) -> impl Future<Output = Result<Vec<Permission>, Self::Error>> + Send + '_;

  /// Grant a permission to a role. Granting twice is a no-op.
  fn grant_permission(
    &self,
    role_id: Uuid,
    permission_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn revoke_permission(
    &self,
    role_id: Uuid,
    permission_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Names of every permission granted to a role, sorted.
  fn permission_names_for_role(
    &self,
    role_id: Uuid,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Students and lecturers ────────────────────────────────────────────

  fn create_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn get_student_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn list_students(&self) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn list_students_by_advisor(
    &self,
    lecturer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Overwrite (or clear) a student's advisor.
  fn set_advisor(
    &self,
    student_id: Uuid,
    advisor_id: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_lecturer(
    &self,
    input: NewLecturer,
  ) -> impl Future<Output = Result<Lecturer, Self::Error>> + Send + '_;

  fn get_lecturer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lecturer>, Self::Error>> + Send + '_;

  fn get_lecturer_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Lecturer>, Self::Error>> + Send + '_;

  fn list_lecturers(&self)
  -> impl Future<Output = Result<Vec<Lecturer>, Self::Error>> + Send + '_;

  // ── Achievement references ────────────────────────────────────────────

  fn insert_reference(
    &self,
    reference: AchievementReference,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_reference(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AchievementReference>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_references(
    &self,
    scope: ReferenceScope,
    status: Option<AchievementStatus>,
  ) -> impl Future<Output = Result<Vec<AchievementReference>, Self::Error>> + Send + '_;

  /// Whether any reference, soft-deleted ones included, belongs to the student.
  fn has_references(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Persist the workflow fields (status, stamps, verifier, note).
  fn update_reference(
    &self,
    reference: AchievementReference,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Reference counts grouped by status, excluding `deleted`, optionally for
  /// one student only.
  fn count_by_status(
    &self,
    student_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<StatusCount>, Self::Error>> + Send + '_;
}

// ─── Document store ──────────────────────────────────────────────────────────

/// Achievement content. Documents are never deleted.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn insert_document(
    &self,
    document: AchievementDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AchievementDocument>, Self::Error>> + Send + '_;

  /// Replace the stored content. Returns `false` for an unknown id.
  fn replace_document(
    &self,
    document: AchievementDocument,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Append a file name to the attachment list.
  fn push_attachment(
    &self,
    id: Uuid,
    filename: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_document_ids(&self) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;
}
