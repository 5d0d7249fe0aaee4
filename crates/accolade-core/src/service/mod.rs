//! Orchestration over the two stores.
//!
//! Each service is constructed with the stores it needs and evaluates the
//! policy table once per operation before applying ownership rules.

mod achievements;
mod directory;
mod reports;

pub use achievements::Achievements;
pub use directory::Directory;
pub use reports::{OrphanReport, Reports, StudentReport};

use crate::{
  Error, Result,
  academic::{Lecturer, Student},
  policy::RoleKind,
  principal::Principal,
  store::DirectoryStore,
};

/// The caller's own student profile.
pub(crate) async fn own_student<R: DirectoryStore>(
  directory: &R,
  caller: &Principal,
) -> Result<Student> {
  directory
    .get_student_by_user(caller.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::forbidden("this account has no student profile"))
}

/// The caller's own lecturer profile.
pub(crate) async fn own_lecturer<R: DirectoryStore>(
  directory: &R,
  caller: &Principal,
) -> Result<Lecturer> {
  directory
    .get_lecturer_by_user(caller.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::forbidden("this account has no lecturer profile"))
}

pub(crate) async fn find_student<R: DirectoryStore>(
  directory: &R,
  id: uuid::Uuid,
) -> Result<Student> {
  directory
    .get_student(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found(format!("student {id} not found")))
}

/// Admins see every student, advisors their advisees, students themselves.
pub(crate) async fn ensure_student_visible<R: DirectoryStore>(
  directory: &R,
  caller: &Principal,
  role: RoleKind,
  student: &Student,
) -> Result<()> {
  match role {
    RoleKind::Admin => Ok(()),
    RoleKind::Student => {
      let own = own_student(directory, caller).await?;
      if own.id == student.id {
        Ok(())
      } else {
        Err(Error::forbidden("students may only access their own records"))
      }
    }
    RoleKind::Advisor => {
      let lecturer = own_lecturer(directory, caller).await?;
      if student.is_advised_by(lecturer.id) {
        Ok(())
      } else {
        Err(Error::forbidden(format!("student {} is not your advisee", student.id)))
      }
    }
  }
}
