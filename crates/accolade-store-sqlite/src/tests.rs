//! Integration tests for both SQLite stores against in-memory databases.

use accolade_core::{
  academic::{NewLecturer, NewStudent},
  achievement::{
    AchievementDocument, AchievementReference, AchievementStatus, NewAchievement, StatusCount,
  },
  identity::{NewPermission, NewUser, User, UserChanges},
  store::{DirectoryStore, DocumentStore, ReferenceScope},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{SqliteDocumentStore, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn documents() -> SqliteDocumentStore {
  SqliteDocumentStore::open_in_memory()
    .await
    .expect("in-memory document store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  let role = match s.get_role_by_name("Student").await.unwrap() {
    Some(role) => role,
    None => s.create_role("Student", "").await.unwrap(),
  };
  s.create_user(NewUser {
    username:      username.into(),
    email:         format!("{username}@example.edu"),
    password_hash: "$argon2id$placeholder".into(),
    full_name:     username.to_uppercase(),
    role_id:       role.id,
    is_active:     true,
  })
  .await
  .unwrap()
}

async fn student(s: &SqliteStore, number: &str, advisor: Option<Uuid>) -> Uuid {
  let u = user(s, &format!("s{number}")).await;
  s.create_student(NewStudent {
    user_id:        u.id,
    student_number: number.into(),
    program:        "Informatics".into(),
    academic_year:  "2024".into(),
    advisor_id:     advisor,
  })
  .await
  .unwrap()
  .id
}

async fn lecturer(s: &SqliteStore, number: &str) -> Uuid {
  let u = user(s, &format!("l{number}")).await;
  s.create_lecturer(NewLecturer {
    user_id:         u.id,
    lecturer_number: number.into(),
    department:      "Computing".into(),
  })
  .await
  .unwrap()
  .id
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_user() {
  let s = store().await;
  let created = user(&s, "alice").await;

  let by_id = s.get_user(created.id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "alice");
  assert_eq!(by_id.password_hash, "$argon2id$placeholder");
  assert!(by_id.is_active);

  let by_name = s.get_user_by_username("alice").await.unwrap().unwrap();
  assert_eq!(by_name.id, created.id);
  assert!(s.get_user_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected_by_the_schema() {
  let s = store().await;
  user(&s, "alice").await;
  let role = s.get_role_by_name("student").await.unwrap().unwrap();
  let dup = s
    .create_user(NewUser {
      username:      "alice".into(),
      email:         "other@example.edu".into(),
      password_hash: "x".into(),
      full_name:     "Other".into(),
      role_id:       role.id,
      is_active:     true,
    })
    .await;
  assert!(dup.is_err());
}

#[tokio::test]
async fn update_user_keeps_hash_unless_given() {
  let s = store().await;
  let u = user(&s, "alice").await;

  let updated = s
    .update_user(u.id, UserChanges {
      username:      "alice2".into(),
      email:         "a2@example.edu".into(),
      full_name:     "Alice Two".into(),
      is_active:     false,
      password_hash: None,
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.username, "alice2");
  assert!(!updated.is_active);
  assert_eq!(updated.password_hash, u.password_hash);
  assert!(updated.updated_at >= u.updated_at);

  let rehashed = s
    .update_user(u.id, UserChanges {
      username:      "alice2".into(),
      email:         "a2@example.edu".into(),
      full_name:     "Alice Two".into(),
      is_active:     true,
      password_hash: Some("$argon2id$new".into()),
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(rehashed.password_hash, "$argon2id$new");

  let missing = s
    .update_user(Uuid::new_v4(), UserChanges {
      username:      "ghost".into(),
      email:         String::new(),
      full_name:     String::new(),
      is_active:     true,
      password_hash: None,
    })
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn delete_and_reassign_user() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let admin = s.create_role("Admin", "").await.unwrap();

  assert!(s.set_user_role(u.id, admin.id).await.unwrap());
  assert_eq!(s.get_user(u.id).await.unwrap().unwrap().role_id, admin.id);

  assert!(s.delete_user(u.id).await.unwrap());
  assert!(!s.delete_user(u.id).await.unwrap());
  assert!(s.get_user(u.id).await.unwrap().is_none());
}

// ─── Roles and permissions ───────────────────────────────────────────────────

#[tokio::test]
async fn role_names_match_case_insensitively() {
  let s = store().await;
  let role = s.create_role("Advisor", "verifies").await.unwrap();
  let found = s.get_role_by_name("ADVISOR").await.unwrap().unwrap();
  assert_eq!(found.id, role.id);
  assert!(s.create_role("advisor", "").await.is_err());
}

#[tokio::test]
async fn grants_are_idempotent_and_sorted() {
  let s = store().await;
  let role = s.create_role("Student", "").await.unwrap();
  let submit = s
    .create_permission(NewPermission {
      resource:    "achievement".into(),
      action:      "submit".into(),
      description: String::new(),
    })
    .await
    .unwrap();
  let create = s
    .create_permission(NewPermission {
      resource:    "achievement".into(),
      action:      "create".into(),
      description: String::new(),
    })
    .await
    .unwrap();
  assert_eq!(submit.name, "achievement:submit");

  s.grant_permission(role.id, submit.id).await.unwrap();
  s.grant_permission(role.id, submit.id).await.unwrap();
  s.grant_permission(role.id, create.id).await.unwrap();

  let names = s.permission_names_for_role(role.id).await.unwrap();
  assert_eq!(names, vec!["achievement:create", "achievement:submit"]);

  assert!(s.revoke_permission(role.id, submit.id).await.unwrap());
  assert!(!s.revoke_permission(role.id, submit.id).await.unwrap());
  assert_eq!(
    s.permission_names_for_role(role.id).await.unwrap(),
    vec!["achievement:create"]
  );

  let by_name = s
    .get_permission_by_name("achievement:create")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_name.id, create.id);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn advisor_assignment_and_advisee_listing() {
  let s = store().await;
  let l1 = lecturer(&s, "L1").await;
  let l2 = lecturer(&s, "L2").await;
  let a = student(&s, "S1", Some(l1)).await;
  let b = student(&s, "S2", None).await;

  let advisees = s.list_students_by_advisor(l1).await.unwrap();
  assert_eq!(advisees.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a]);

  assert!(s.set_advisor(b, Some(l1)).await.unwrap());
  assert!(s.set_advisor(a, Some(l2)).await.unwrap());
  let advisees = s.list_students_by_advisor(l1).await.unwrap();
  assert_eq!(advisees.iter().map(|s| s.id).collect::<Vec<_>>(), vec![b]);

  assert!(s.set_advisor(b, None).await.unwrap());
  assert!(s.get_student(b).await.unwrap().unwrap().advisor_id.is_none());
  assert!(!s.set_advisor(Uuid::new_v4(), Some(l1)).await.unwrap());

  assert_eq!(s.list_students().await.unwrap().len(), 2);
  assert_eq!(s.list_lecturers().await.unwrap().len(), 2);
}

#[tokio::test]
async fn profiles_are_found_by_user() {
  let s = store().await;
  let u = user(&s, "dosen").await;
  let l = s
    .create_lecturer(NewLecturer {
      user_id:         u.id,
      lecturer_number: "L9".into(),
      department:      "Math".into(),
    })
    .await
    .unwrap();

  assert_eq!(s.get_lecturer_by_user(u.id).await.unwrap().unwrap().id, l.id);
  assert!(s.get_student_by_user(u.id).await.unwrap().is_none());
}

// ─── References ──────────────────────────────────────────────────────────────

fn reference_at(student_id: Uuid, offset_secs: i64) -> AchievementReference {
  let at = Utc::now() + Duration::seconds(offset_secs);
  AchievementReference::draft(student_id, Uuid::new_v4(), at)
}

#[tokio::test]
async fn reference_round_trips_workflow_fields() {
  let s = store().await;
  let sid = student(&s, "S1", None).await;
  let mut r = reference_at(sid, 0);
  s.insert_reference(r.clone()).await.unwrap();
  assert_eq!(s.get_reference(r.id).await.unwrap().unwrap(), r);

  r.status = AchievementStatus::Rejected;
  r.verified_at = Some(Utc::now());
  r.verified_by = Some(Uuid::new_v4());
  r.rejection_note = Some("missing certificate".into());
  r.updated_at = Utc::now();
  assert!(s.update_reference(r.clone()).await.unwrap());
  assert_eq!(s.get_reference(r.id).await.unwrap().unwrap(), r);

  let unknown = reference_at(sid, 0);
  assert!(!s.update_reference(unknown).await.unwrap());
}

#[tokio::test]
async fn list_references_scopes_and_ordering() {
  let s = store().await;
  let adv = lecturer(&s, "L1").await;
  let mine = student(&s, "S1", Some(adv)).await;
  let other = student(&s, "S2", None).await;

  let old = reference_at(mine, -60);
  let new = reference_at(mine, 0);
  let mut gone = reference_at(mine, -30);
  gone.status = AchievementStatus::Deleted;
  let foreign = reference_at(other, -10);
  for r in [&old, &new, &gone, &foreign] {
    s.insert_reference(r.clone()).await.unwrap();
  }

  let all = s.list_references(ReferenceScope::All, None).await.unwrap();
  assert_eq!(
    all.iter().map(|r| r.id).collect::<Vec<_>>(),
    vec![new.id, foreign.id, gone.id, old.id]
  );

  let own = s
    .list_references(ReferenceScope::Student(mine), None)
    .await
    .unwrap();
  assert_eq!(own.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);

  let advised = s
    .list_references(ReferenceScope::Advisor(adv), None)
    .await
    .unwrap();
  assert_eq!(advised.len(), 2);
  assert!(advised.iter().all(|r| r.student_id == mine));

  let drafts = s
    .list_references(ReferenceScope::All, Some(AchievementStatus::Draft))
    .await
    .unwrap();
  assert_eq!(drafts.len(), 3);
}

#[tokio::test]
async fn counts_exclude_deleted() {
  let s = store().await;
  let a = student(&s, "S1", None).await;
  let b = student(&s, "S2", None).await;

  let mut verified = reference_at(a, 0);
  verified.status = AchievementStatus::Verified;
  let mut deleted = reference_at(a, 0);
  deleted.status = AchievementStatus::Deleted;
  for r in [reference_at(a, 0), verified, deleted, reference_at(b, 0)] {
    s.insert_reference(r).await.unwrap();
  }

  let global = s.count_by_status(None).await.unwrap();
  let total = |counts: &[StatusCount], st: AchievementStatus| {
    counts.iter().find(|c| c.status == st).map_or(0, |c| c.total)
  };
  assert_eq!(total(&global, AchievementStatus::Draft), 2);
  assert_eq!(total(&global, AchievementStatus::Verified), 1);
  assert_eq!(total(&global, AchievementStatus::Deleted), 0);

  let only_a = s.count_by_status(Some(a)).await.unwrap();
  assert_eq!(total(&only_a, AchievementStatus::Draft), 1);
  assert_eq!(only_a.iter().map(|c| c.total).sum::<u64>(), 2);
}

#[tokio::test]
async fn soft_deleted_references_still_count_as_held() {
  let s = store().await;
  let a = student(&s, "S1", None).await;
  let b = student(&s, "S2", None).await;
  assert!(!s.has_references(a).await.unwrap());

  let mut deleted = reference_at(a, 0);
  deleted.status = AchievementStatus::Deleted;
  s.insert_reference(deleted).await.unwrap();

  assert!(s.has_references(a).await.unwrap());
  assert!(!s.has_references(b).await.unwrap());
}

// ─── Documents ───────────────────────────────────────────────────────────────

fn new_document(student_id: Uuid) -> AchievementDocument {
  NewAchievement {
    achievement_type: "competition".into(),
    title: "Regional programming contest".into(),
    points: 50,
    ..Default::default()
  }
  .into_document(student_id, Utc::now())
}

#[tokio::test]
async fn documents_insert_replace_and_attach() {
  let d = documents().await;
  let mut doc = new_document(Uuid::new_v4());
  d.insert_document(doc.clone()).await.unwrap();
  assert_eq!(d.get_document(doc.id).await.unwrap().unwrap(), doc);

  doc.title = "National programming contest".into();
  assert!(d.replace_document(doc.clone()).await.unwrap());

  assert!(d.push_attachment(doc.id, "20240101_120000_cert.pdf".into()).await.unwrap());
  assert!(d.push_attachment(doc.id, "20240101_120001_photo.jpg".into()).await.unwrap());

  let stored = d.get_document(doc.id).await.unwrap().unwrap();
  assert_eq!(stored.title, "National programming contest");
  assert_eq!(stored.attachments, vec![
    "20240101_120000_cert.pdf".to_owned(),
    "20240101_120001_photo.jpg".to_owned(),
  ]);
}

#[tokio::test]
async fn unknown_documents() {
  let d = documents().await;
  let ghost = new_document(Uuid::new_v4());
  assert!(d.get_document(ghost.id).await.unwrap().is_none());
  assert!(!d.replace_document(ghost.clone()).await.unwrap());
  assert!(!d.push_attachment(ghost.id, "x.pdf".into()).await.unwrap());
  assert!(d.list_document_ids().await.unwrap().is_empty());

  d.insert_document(ghost.clone()).await.unwrap();
  assert_eq!(d.list_document_ids().await.unwrap(), vec![ghost.id]);
}
