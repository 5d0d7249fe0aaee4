//! Achievement records.
//!
//! An achievement is split in two: the [`AchievementReference`] lives in the
//! relational store and is the authority for workflow state and ownership;
//! the [`AchievementDocument`] lives in the document store and is the
//! authority for content. A reference owns exactly one document by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Workflow state of an achievement reference.
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
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AchievementStatus {
  Draft,
  Submitted,
  Verified,
  Rejected,
  Deleted,
}

// ─── Reference ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementReference {
  pub id:             Uuid,
  pub student_id:     Uuid,
  /// Id of the owned [`AchievementDocument`]; unique across references.
  pub document_id:    Uuid,
  pub status:         AchievementStatus,
  pub submitted_at:   Option<DateTime<Utc>>,
  pub verified_at:    Option<DateTime<Utc>>,
  /// User id of the advisor who verified or rejected.
  pub verified_by:    Option<Uuid>,
  pub rejection_note: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl AchievementReference {
  /// A fresh `draft` reference pointing at `document_id`.
  pub fn draft(student_id: Uuid, document_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      student_id,
      document_id,
      status: AchievementStatus::Draft,
      submitted_at: None,
      verified_at: None,
      verified_by: None,
      rejection_note: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn history(&self) -> StatusHistory {
    StatusHistory {
      status:         self.status,
      submitted_at:   self.submitted_at,
      verified_at:    self.verified_at,
      verified_by:    self.verified_by,
      rejection_note: self.rejection_note.clone(),
    }
  }
}

/// The workflow fields of a reference, without ownership data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistory {
  pub status:         AchievementStatus,
  pub submitted_at:   Option<DateTime<Utc>>,
  pub verified_at:    Option<DateTime<Utc>>,
  pub verified_by:    Option<Uuid>,
  pub rejection_note: Option<String>,
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDocument {
  pub id:               Uuid,
  pub student_id:       Uuid,
  pub achievement_type: String,
  pub title:            String,
  pub description:      String,
  /// Free-form attributes, e.g. competition name and rank.
  #[serde(default)]
  pub details:          Map<String, Value>,
  /// Stored file names (not paths) under the uploads directory.
  #[serde(default)]
  pub attachments:      Vec<String>,
  #[serde(default)]
  pub tags:             Vec<String>,
  #[serde(default)]
  pub points:           i64,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Content accepted when creating an achievement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAchievement {
  /// Students may omit this; it defaults to their own student record.
  #[serde(default)]
  pub student_id:       Option<Uuid>,
  #[serde(default)]
  pub achievement_type: String,
  pub title:            String,
  #[serde(default)]
  pub description:      String,
  #[serde(default)]
  pub details:          Map<String, Value>,
  #[serde(default)]
  pub tags:             Vec<String>,
  #[serde(default)]
  pub points:           i64,
}

impl NewAchievement {
  pub fn into_document(self, student_id: Uuid, now: DateTime<Utc>) -> AchievementDocument {
    AchievementDocument {
      id: Uuid::new_v4(),
      student_id,
      achievement_type: self.achievement_type,
      title: self.title,
      description: self.description,
      details: self.details,
      attachments: Vec::new(),
      tags: self.tags,
      points: self.points,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Partial update of a draft's content. Empty values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub details:     Option<Map<String, Value>>,
  pub tags:        Option<Vec<String>>,
  pub points:      Option<i64>,
}

impl AchievementPatch {
  /// Copy every non-empty field into `doc` and refresh its update stamp.
  pub fn apply(self, doc: &mut AchievementDocument, now: DateTime<Utc>) {
    if let Some(title) = self.title.filter(|s| !s.is_empty()) {
      doc.title = title;
    }
    if let Some(description) = self.description.filter(|s| !s.is_empty()) {
      doc.description = description;
    }
    if let Some(details) = self.details.filter(|m| !m.is_empty()) {
      doc.details = details;
    }
    if let Some(tags) = self.tags.filter(|t| !t.is_empty()) {
      doc.tags = tags;
    }
    if let Some(points) = self.points.filter(|p| *p != 0) {
      doc.points = points;
    }
    doc.updated_at = now;
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A reference joined with its document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
  pub reference:   AchievementReference,
  pub achievement: AchievementDocument,
}

/// One row of a status histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
  pub status: AchievementStatus,
  pub total:  u64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn doc() -> AchievementDocument {
    let now = Utc::now();
    NewAchievement {
      student_id: None,
      achievement_type: "competition".into(),
      title: "Hackathon".into(),
      description: "National round".into(),
      details: json!({ "rank": 1 }).as_object().cloned().unwrap(),
      tags: vec!["programming".into()],
      points: 100,
    }
    .into_document(Uuid::new_v4(), now)
  }

  #[test]
  fn status_round_trips_through_strings() {
    assert_eq!(AchievementStatus::Submitted.to_string(), "submitted");
    assert_eq!(
      "rejected".parse::<AchievementStatus>().unwrap(),
      AchievementStatus::Rejected
    );
    assert!("archived".parse::<AchievementStatus>().is_err());
    assert_eq!(
      serde_json::to_value(AchievementStatus::Draft).unwrap(),
      json!("draft")
    );
  }

  #[test]
  fn patch_copies_only_non_empty_fields() {
    let mut d = doc();
    let before = d.clone();
    let later = before.updated_at + chrono::Duration::seconds(5);

    AchievementPatch {
      title:       Some("Hackathon (final)".into()),
      description: Some(String::new()),
      details:     Some(Map::new()),
      tags:        None,
      points:      Some(0),
    }
    .apply(&mut d, later);

    assert_eq!(d.title, "Hackathon (final)");
    assert_eq!(d.description, before.description);
    assert_eq!(d.details, before.details);
    assert_eq!(d.tags, before.tags);
    assert_eq!(d.points, 100);
    assert_eq!(d.updated_at, later);
  }

  #[test]
  fn empty_patch_still_refreshes_timestamp() {
    let mut d = doc();
    let later = d.updated_at + chrono::Duration::seconds(1);
    AchievementPatch::default().apply(&mut d, later);
    assert_eq!(d.updated_at, later);
    assert_eq!(d.created_at + chrono::Duration::seconds(1), later);
  }

  #[test]
  fn draft_reference_points_at_document() {
    let d = doc();
    let r = AchievementReference::draft(d.student_id, d.id, d.created_at);
    assert_eq!(r.document_id, d.id);
    assert_eq!(r.status, AchievementStatus::Draft);
    assert!(r.submitted_at.is_none() && r.verified_by.is_none());
  }
}
