//! The achievement workflow service.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ensure_student_visible, find_student, own_lecturer, own_student};
use crate::{
  Error, Result,
  achievement::{
    Achievement, AchievementDocument, AchievementPatch, AchievementReference,
    AchievementStatus, NewAchievement, StatusHistory,
  },
  policy::{Action, Resource, RoleKind},
  principal::Principal,
  store::{DirectoryStore, DocumentStore, ReferenceScope},
  workflow::{self, Transition},
};

/// Creates, edits, and moves achievements through their workflow.
pub struct Achievements<R, D> {
  directory: Arc<R>,
  documents: Arc<D>,
}

impl<R, D> Clone for Achievements<R, D> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      documents: self.documents.clone(),
    }
  }
}

impl<R, D> Achievements<R, D>
where
  R: DirectoryStore,
  D: DocumentStore,
{
  pub fn new(directory: Arc<R>, documents: Arc<D>) -> Self { Self { directory, documents } }

  // ── Create ──────────────────────────────────────────────────────────────

  /// Write a new document, then a `draft` reference pointing at it.
  ///
  /// The two writes are independent. If the reference insert fails the
  /// document stays behind without a reference; the orphan sweep in
  /// [`super::Reports::orphans`] reports it.
  pub async fn create(&self, caller: &Principal, input: NewAchievement) -> Result<Achievement> {
    let role = caller.authorize(Resource::Achievement, Action::Create)?;

    if input.title.trim().is_empty() {
      return Err(Error::validation("title is required"));
    }

    let student_id = match role {
      RoleKind::Student => {
        let own = own_student(self.directory.as_ref(), caller).await?;
        match input.student_id {
          Some(id) if id != own.id => {
            return Err(Error::forbidden("students may only create their own achievements"));
          }
          _ => own.id,
        }
      }
      _ => {
        let id = input
          .student_id
          .ok_or_else(|| Error::validation("student_id is required"))?;
        find_student(self.directory.as_ref(), id).await?.id
      }
    };

    let now = Utc::now();
    let document = input.into_document(student_id, now);
    self
      .documents
      .insert_document(document.clone())
      .await
      .map_err(Error::store)?;

    let reference = AchievementReference::draft(student_id, document.id, now);
    self
      .directory
      .insert_reference(reference.clone())
      .await
      .map_err(Error::store)?;

    info!(achievement = %reference.id, student = %student_id, "achievement created");
    Ok(Achievement { reference, achievement: document })
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// Achievements visible to the caller, newest first.
  pub async fn list(
    &self,
    caller: &Principal,
    status: Option<AchievementStatus>,
  ) -> Result<Vec<Achievement>> {
    let role = caller.authorize(Resource::Achievement, Action::Read)?;

    let scope = match role {
      RoleKind::Admin => ReferenceScope::All,
      RoleKind::Student => {
        ReferenceScope::Student(own_student(self.directory.as_ref(), caller).await?.id)
      }
      RoleKind::Advisor => {
        ReferenceScope::Advisor(own_lecturer(self.directory.as_ref(), caller).await?.id)
      }
    };

    let references = self
      .directory
      .list_references(scope, status)
      .await
      .map_err(Error::store)?;
    Ok(self.join(references).await)
  }

  /// Non-deleted achievements of one student.
  pub async fn list_for_student(
    &self,
    caller: &Principal,
    student_id: Uuid,
  ) -> Result<Vec<Achievement>> {
    let role = caller.authorize(Resource::Achievement, Action::Read)?;
    let student = find_student(self.directory.as_ref(), student_id).await?;
    ensure_student_visible(self.directory.as_ref(), caller, role, &student).await?;

    let references = self
      .directory
      .list_references(ReferenceScope::Student(student.id), None)
      .await
      .map_err(Error::store)?;
    Ok(self.join(references).await)
  }

  pub async fn get(&self, caller: &Principal, id: Uuid) -> Result<Achievement> {
    let reference = self.visible_reference(caller, id).await?;
    let achievement = self.document_for(&reference).await?;
    Ok(Achievement { reference, achievement })
  }

  pub async fn history(&self, caller: &Principal, id: Uuid) -> Result<StatusHistory> {
    Ok(self.visible_reference(caller, id).await?.history())
  }

  // ── Content edits ───────────────────────────────────────────────────────

  /// Patch a draft's content. Any other status is rejected untouched.
  pub async fn update(
    &self,
    caller: &Principal,
    id: Uuid,
    patch: AchievementPatch,
  ) -> Result<Achievement> {
    let role = caller.authorize(Resource::Achievement, Action::Update)?;
    let reference = self.reference(id).await?;
    if role == RoleKind::Student {
      self.ensure_owner(caller, &reference).await?;
    }
    workflow::ensure_draft(&reference)?;

    let mut document = self.document_for(&reference).await?;
    patch.apply(&mut document, Utc::now());
    let replaced = self
      .documents
      .replace_document(document.clone())
      .await
      .map_err(Error::store)?;
    if !replaced {
      return Err(self.missing_document(&reference));
    }

    info!(achievement = %id, "achievement updated");
    Ok(Achievement { reference, achievement: document })
  }

  /// Check the caller may attach a file before anything is written to disk.
  pub async fn prepare_attachment(
    &self,
    caller: &Principal,
    id: Uuid,
  ) -> Result<AchievementReference> {
    let role = caller.authorize(Resource::Achievement, Action::Attach)?;
    let reference = self.reference(id).await?;
    if role == RoleKind::Student {
      self.ensure_owner(caller, &reference).await?;
    }
    Ok(reference)
  }

  /// Record a stored file name on the reference's document.
  pub async fn record_attachment(
    &self,
    reference: &AchievementReference,
    filename: String,
  ) -> Result<()> {
    let pushed = self
      .documents
      .push_attachment(reference.document_id, filename.clone())
      .await
      .map_err(Error::store)?;
    if !pushed {
      return Err(self.missing_document(reference));
    }
    info!(achievement = %reference.id, %filename, "attachment added");
    Ok(())
  }

  // ── Transitions ─────────────────────────────────────────────────────────

  /// Owning student moves a draft to `submitted`.
  pub async fn submit(&self, caller: &Principal, id: Uuid) -> Result<AchievementReference> {
    caller.authorize(Resource::Achievement, Action::Submit)?;
    let mut reference = self.reference(id).await?;
    self.ensure_owner(caller, &reference).await?;
    self.transition(&mut reference, Transition::Submit).await?;
    Ok(reference)
  }

  /// The student's advisor marks the achievement verified.
  pub async fn verify(&self, caller: &Principal, id: Uuid) -> Result<AchievementReference> {
    caller.authorize(Resource::Achievement, Action::Verify)?;
    let mut reference = self.reference(id).await?;
    self.ensure_advisor(caller, &reference).await?;
    self
      .transition(&mut reference, Transition::Verify { by: caller.user_id })
      .await?;
    Ok(reference)
  }

  /// The student's advisor rejects the achievement with a note.
  pub async fn reject(
    &self,
    caller: &Principal,
    id: Uuid,
    note: String,
  ) -> Result<AchievementReference> {
    caller.authorize(Resource::Achievement, Action::Reject)?;
    let mut reference = self.reference(id).await?;
    self.ensure_advisor(caller, &reference).await?;
    self
      .transition(&mut reference, Transition::Reject { by: caller.user_id, note })
      .await?;
    Ok(reference)
  }

  /// Soft delete. Admins may delete from any status; students only their own
  /// drafts.
  pub async fn delete(&self, caller: &Principal, id: Uuid) -> Result<AchievementReference> {
    let role = caller.authorize(Resource::Achievement, Action::Delete)?;
    let mut reference = self.reference(id).await?;

    if role != RoleKind::Admin {
      self.ensure_owner(caller, &reference).await?;
      if reference.status != AchievementStatus::Draft {
        return Err(Error::forbidden("students may only delete drafts"));
      }
    }

    self.transition(&mut reference, Transition::Delete).await?;
    Ok(reference)
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  async fn transition(
    &self,
    reference: &mut AchievementReference,
    transition: Transition,
  ) -> Result<()> {
    let from = reference.status;
    let name = transition.to_string();
    workflow::apply(reference, transition, Utc::now())?;

    let updated = self
      .directory
      .update_reference(reference.clone())
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::not_found(format!("achievement {} not found", reference.id)));
    }

    info!(
      achievement = %reference.id,
      transition = %name,
      %from,
      to = %reference.status,
      "achievement transitioned"
    );
    Ok(())
  }

  async fn reference(&self, id: Uuid) -> Result<AchievementReference> {
    self
      .directory
      .get_reference(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(format!("achievement {id} not found")))
  }

  async fn visible_reference(&self, caller: &Principal, id: Uuid) -> Result<AchievementReference> {
    let role = caller.authorize(Resource::Achievement, Action::Read)?;
    let reference = self.reference(id).await?;
    if role != RoleKind::Admin {
      let student = find_student(self.directory.as_ref(), reference.student_id).await?;
      ensure_student_visible(self.directory.as_ref(), caller, role, &student).await?;
    }
    Ok(reference)
  }

  async fn ensure_owner(&self, caller: &Principal, reference: &AchievementReference) -> Result<()> {
    let own = own_student(self.directory.as_ref(), caller).await?;
    if own.id == reference.student_id {
      Ok(())
    } else {
      Err(Error::forbidden("this achievement belongs to another student"))
    }
  }

  async fn ensure_advisor(
    &self,
    caller: &Principal,
    reference: &AchievementReference,
  ) -> Result<()> {
    let lecturer = own_lecturer(self.directory.as_ref(), caller).await?;
    let advised = self
      .directory
      .get_student(reference.student_id)
      .await
      .map_err(Error::store)?
      .is_some_and(|s| s.is_advised_by(lecturer.id));
    if advised {
      Ok(())
    } else {
      Err(Error::forbidden(format!(
        "student {} is not your advisee",
        reference.student_id
      )))
    }
  }

  async fn document_for(&self, reference: &AchievementReference) -> Result<AchievementDocument> {
    self
      .documents
      .get_document(reference.document_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| self.missing_document(reference))
  }

  fn missing_document(&self, reference: &AchievementReference) -> Error {
    Error::not_found(format!(
      "document {} for achievement {} not found",
      reference.document_id, reference.id
    ))
  }

  /// Pair each reference with its document. References whose document is
  /// missing or cannot be read are left out.
  async fn join(&self, references: Vec<AchievementReference>) -> Vec<Achievement> {
    let mut out = Vec::with_capacity(references.len());
    for reference in references {
      match self.documents.get_document(reference.document_id).await {
        Ok(Some(achievement)) => out.push(Achievement { reference, achievement }),
        Ok(None) => {
          warn!(
            achievement = %reference.id,
            document = %reference.document_id,
            "skipping reference without document"
          );
        }
        Err(e) => {
          warn!(achievement = %reference.id, error = %e, "skipping unreadable document");
        }
      }
    }
    out
  }
}
