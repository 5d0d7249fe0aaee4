//! Status statistics and the cross-store consistency sweep.

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{ensure_student_visible, find_student};
use crate::{
  Error, Result,
  academic::Student,
  achievement::StatusCount,
  policy::{Action, Resource},
  principal::Principal,
  store::{DirectoryStore, DocumentStore, ReferenceScope},
};

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
  pub student:    Student,
  pub statistics: Vec<StatusCount>,
}

/// Records left inconsistent by a create that failed halfway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
  /// Documents no reference points at.
  pub orphan_documents:    Vec<Uuid>,
  /// References whose document does not exist.
  pub dangling_references: Vec<Uuid>,
}

pub struct Reports<R, D> {
  directory: Arc<R>,
  documents: Arc<D>,
}

impl<R, D> Clone for Reports<R, D> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      documents: self.documents.clone(),
    }
  }
}

impl<R, D> Reports<R, D>
where
  R: DirectoryStore,
  D: DocumentStore,
{
  pub fn new(directory: Arc<R>, documents: Arc<D>) -> Self { Self { directory, documents } }

  /// Counts per status across every student. Deleted items are not counted.
  pub async fn statistics(&self, caller: &Principal) -> Result<Vec<StatusCount>> {
    caller.authorize(Resource::Report, Action::Overview)?;
    self
      .directory
      .count_by_status(None)
      .await
      .map_err(Error::store)
  }

  pub async fn student_statistics(
    &self,
    caller: &Principal,
    student_id: Uuid,
  ) -> Result<StudentReport> {
    let role = caller.authorize(Resource::Report, Action::Read)?;
    let student = find_student(self.directory.as_ref(), student_id).await?;
    ensure_student_visible(self.directory.as_ref(), caller, role, &student).await?;

    let statistics = self
      .directory
      .count_by_status(Some(student.id))
      .await
      .map_err(Error::store)?;
    Ok(StudentReport { student, statistics })
  }

  /// Compare both stores and list what does not line up.
  pub async fn orphans(&self, caller: &Principal) -> Result<OrphanReport> {
    caller.authorize(Resource::Report, Action::Audit)?;

    let references = self
      .directory
      .list_references(ReferenceScope::All, None)
      .await
      .map_err(Error::store)?;
    let documents: HashSet<Uuid> = self
      .documents
      .list_document_ids()
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();

    let referenced: HashSet<Uuid> = references.iter().map(|r| r.document_id).collect();

    let mut report = OrphanReport {
      orphan_documents:    documents.difference(&referenced).copied().collect(),
      dangling_references: references
        .iter()
        .filter(|r| !documents.contains(&r.document_id))
        .map(|r| r.id)
        .collect(),
    };
    report.orphan_documents.sort();
    report.dangling_references.sort();

    info!(
      orphan_documents = report.orphan_documents.len(),
      dangling_references = report.dangling_references.len(),
      "orphan sweep finished"
    );
    Ok(report)
  }
}
