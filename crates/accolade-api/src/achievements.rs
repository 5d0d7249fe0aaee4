//! Handlers for `/achievements` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/achievements` | Optional `?status=draft\|submitted\|..` |
//! | `POST`   | `/achievements` | Creates a draft |
//! | `GET`    | `/achievements/{id}` | Reference joined with its document |
//! | `PUT`    | `/achievements/{id}` | Drafts only |
//! | `DELETE` | `/achievements/{id}` | Soft delete |
//! | `POST`   | `/achievements/{id}/submit` | Owning student |
//! | `POST`   | `/achievements/{id}/verify` | Student's advisor |
//! | `POST`   | `/achievements/{id}/reject` | Body: `{"note":"..."}` |
//! | `GET`    | `/achievements/{id}/history` | |
//! | `POST`   | `/achievements/{id}/attachments` | Multipart field `file` |

use std::path::Path as FsPath;

use accolade_core::{
  Error,
  achievement::{
    Achievement, AchievementPatch, AchievementReference, AchievementStatus, NewAchievement,
    StatusHistory,
  },
  store::{DirectoryStore, DocumentStore},
};
use axum::{
  extract::{Multipart, State},
  http::StatusCode,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, created, ok},
  error::ApiError,
  extract::{Json, Path, Query},
};

type Reply<T> = Result<Json<Envelope<T>>, ApiError>;

// ─── List / create ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<AchievementStatus>,
}

/// `GET /achievements[?status=<status>]`
pub async fn list<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Reply<Vec<Achievement>>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().list(&caller, params.status).await?))
}

/// `POST /achievements`
pub async fn create<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewAchievement>,
) -> Result<(StatusCode, Json<Envelope<Achievement>>), ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(created(state.achievements().create(&caller, body).await?))
}

// ─── One achievement ─────────────────────────────────────────────────────────

/// `GET /achievements/{id}`
pub async fn get_one<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Reply<Achievement>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().get(&caller, id).await?))
}

/// `PUT /achievements/{id}`
pub async fn update<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<AchievementPatch>,
) -> Reply<Achievement>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().update(&caller, id, patch).await?))
}

/// `DELETE /achievements/{id}`
pub async fn delete<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Reply<AchievementReference>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().delete(&caller, id).await?))
}

/// `GET /achievements/{id}/history`
pub async fn history<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Reply<StatusHistory>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().history(&caller, id).await?))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /achievements/{id}/submit`
pub async fn submit<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Reply<AchievementReference>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().submit(&caller, id).await?))
}

/// `POST /achievements/{id}/verify`
pub async fn verify<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Reply<AchievementReference>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().verify(&caller, id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  #[serde(default)]
  pub note: String,
}

/// `POST /achievements/{id}/reject`
pub async fn reject<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Reply<AchievementReference>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().reject(&caller, id, body.note).await?))
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Attached {
  pub filename: String,
}

/// `POST /achievements/{id}/attachments`
///
/// The file is written under the uploads directory before its name is
/// recorded on the document.
pub async fn attach<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<Envelope<Attached>>), ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  let service = state.achievements();
  let reference = service.prepare_attachment(&caller, id).await?;

  let (original, data) = read_file_field(&mut multipart).await?;
  let filename = stored_name(Utc::now(), &original)?;
  write_upload(&state.uploads, &filename, data).await?;

  service.record_attachment(&reference, filename.clone()).await?;
  Ok(created(Attached { filename }))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.body_text()))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let name = field
      .file_name()
      .map(str::to_owned)
      .ok_or_else(|| ApiError::BadRequest("file field has no file name".into()))?;
    let data = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    return Ok((name, data));
  }
  Err(ApiError::BadRequest("multipart field \"file\" is required".into()))
}

/// `<YYYYmmdd_HHMMSS>_<base name>`. Any directory part of the client's name
/// is dropped.
pub fn stored_name(now: DateTime<Utc>, original: &str) -> Result<String, Error> {
  let base = original
    .rsplit(['/', '\\'])
    .next()
    .map(str::trim)
    .filter(|b| !b.is_empty() && *b != "." && *b != "..")
    .ok_or_else(|| Error::validation(format!("invalid file name {original:?}")))?;
  Ok(format!("{}_{base}", now.format("%Y%m%d_%H%M%S")))
}

async fn write_upload(dir: &FsPath, filename: &str, data: Bytes) -> Result<(), ApiError> {
  tokio::fs::create_dir_all(dir).await?;
  tokio::fs::write(dir.join(filename), &data).await?;
  Ok(())
}
