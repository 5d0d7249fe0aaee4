//! Status transitions for achievement references.
//!
//! ```text
//! draft --submit--> submitted --verify--> verified
//!   |                  |
//!   +--delete          +--reject--> rejected
//! ```
//!
//! Only the status-dependent rules live here. Who may request a transition
//! (owner, advisor, admin) is decided by the achievement service.

use chrono::{DateTime, Utc};
use strum::Display;
use uuid::Uuid;

use crate::{
  Error, Result,
  achievement::{AchievementReference, AchievementStatus},
};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Transition {
  Submit,
  /// `by` is the verifying advisor's user id.
  Verify { by: Uuid },
  Reject { by: Uuid, note: String },
  Delete,
}

/// Fail unless the reference is still a draft.
pub fn ensure_draft(reference: &AchievementReference) -> Result<()> {
  if reference.status == AchievementStatus::Draft {
    Ok(())
  } else {
    Err(Error::InvalidState {
      id:       reference.id,
      status:   reference.status,
      expected: "draft",
    })
  }
}

/// Apply `transition` to `reference` in place, stamping the relevant fields.
///
/// Verify and reject are accepted from any status except `deleted`, so an
/// already verified or rejected item can be re-decided; the stamps are
/// overwritten. Delete is accepted from any status.
pub fn apply(
  reference: &mut AchievementReference,
  transition: Transition,
  now: DateTime<Utc>,
) -> Result<()> {
  match transition {
    Transition::Submit => {
      ensure_draft(reference)?;
      reference.status = AchievementStatus::Submitted;
      reference.submitted_at = Some(now);
    }
    Transition::Verify { by } => {
      ensure_not_deleted(reference)?;
      reference.status = AchievementStatus::Verified;
      reference.verified_at = Some(now);
      reference.verified_by = Some(by);
    }
    Transition::Reject { by, note } => {
      let note = note.trim();
      if note.is_empty() {
        return Err(Error::validation("a rejection note is required"));
      }
      ensure_not_deleted(reference)?;
      reference.status = AchievementStatus::Rejected;
      reference.verified_at = Some(now);
      reference.verified_by = Some(by);
      reference.rejection_note = Some(note.to_owned());
    }
    Transition::Delete => {
      reference.status = AchievementStatus::Deleted;
    }
  }
  reference.updated_at = now;
  Ok(())
}

fn ensure_not_deleted(reference: &AchievementReference) -> Result<()> {
  if reference.status == AchievementStatus::Deleted {
    return Err(Error::InvalidState {
      id:       reference.id,
      status:   reference.status,
      expected: "not deleted",
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use AchievementStatus::*;

  fn reference(status: AchievementStatus) -> AchievementReference {
    let mut r = AchievementReference::draft(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
    r.status = status;
    r
  }

  #[test]
  fn submit_only_from_draft() {
    let now = Utc::now();
    let mut r = reference(Draft);
    apply(&mut r, Transition::Submit, now).unwrap();
    assert_eq!(r.status, Submitted);
    assert_eq!(r.submitted_at, Some(now));

    for status in [Submitted, Verified, Rejected, Deleted] {
      let mut r = reference(status);
      let before = r.clone();
      let err = apply(&mut r, Transition::Submit, now).unwrap_err();
      assert!(matches!(err, Error::InvalidState { expected: "draft", .. }));
      assert_eq!(r, before);
    }
  }

  #[test]
  fn verify_stamps_verifier() {
    let advisor = Uuid::new_v4();
    let now = Utc::now();
    let mut r = reference(Submitted);
    apply(&mut r, Transition::Verify { by: advisor }, now).unwrap();
    assert_eq!(r.status, Verified);
    assert_eq!(r.verified_by, Some(advisor));
    assert_eq!(r.verified_at, Some(now));
  }

  #[test]
  fn re_verifying_a_verified_item_restamps() {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let mut r = reference(Submitted);
    apply(&mut r, Transition::Verify { by: first }, Utc::now()).unwrap();
    let later = Utc::now() + chrono::Duration::seconds(10);
    apply(&mut r, Transition::Verify { by: second }, later).unwrap();
    assert_eq!(r.status, Verified);
    assert_eq!(r.verified_by, Some(second));
    assert_eq!(r.verified_at, Some(later));
  }

  #[test]
  fn reject_requires_a_note() {
    let mut r = reference(Submitted);
    let err = apply(
      &mut r,
      Transition::Reject { by: Uuid::new_v4(), note: "   ".into() },
      Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(r.status, Submitted);

    apply(
      &mut r,
      Transition::Reject { by: Uuid::new_v4(), note: " blurry scan ".into() },
      Utc::now(),
    )
    .unwrap();
    assert_eq!(r.status, Rejected);
    assert_eq!(r.rejection_note.as_deref(), Some("blurry scan"));
  }

  #[test]
  fn deleted_items_cannot_be_decided() {
    let mut r = reference(Deleted);
    assert!(apply(&mut r, Transition::Verify { by: Uuid::new_v4() }, Utc::now()).is_err());
    assert!(
      apply(
        &mut r,
        Transition::Reject { by: Uuid::new_v4(), note: "no".into() },
        Utc::now()
      )
      .is_err()
    );
    assert_eq!(r.status, Deleted);
  }

  #[test]
  fn delete_from_any_status() {
    for status in [Draft, Submitted, Verified, Rejected, Deleted] {
      let mut r = reference(status);
      apply(&mut r, Transition::Delete, Utc::now()).unwrap();
      assert_eq!(r.status, Deleted);
    }
  }
}
