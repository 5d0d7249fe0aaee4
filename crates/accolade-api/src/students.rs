//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | Scoped by caller role |
//! | `POST` | `/students` | Admin; profile for an existing user |
//! | `GET`  | `/students/{id}` | |
//! | `GET`  | `/students/{id}/achievements` | Non-deleted achievements |
//! | `PUT`  | `/students/{id}/advisor` | Body: `{"advisor_id": uuid \| null}` |

use accolade_core::{
  academic::{NewStudent, Student},
  achievement::Achievement,
  store::{DirectoryStore, DocumentStore},
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, created, ok},
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /students`
pub async fn list<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<Student>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_students(&caller).await?))
}

/// `POST /students`
pub async fn create<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewStudent>,
) -> Result<(StatusCode, Json<Envelope<Student>>), ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(created(state.people().create_student(&caller, body).await?))
}

/// `GET /students/{id}`
pub async fn get_one<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Student>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().get_student(&caller, id).await?))
}

/// `GET /students/{id}/achievements`
pub async fn achievements<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<Achievement>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.achievements().list_for_student(&caller, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AdvisorBody {
  /// `null` clears the assignment.
  pub advisor_id: Option<Uuid>,
}

/// `PUT /students/{id}/advisor`
pub async fn set_advisor<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<AdvisorBody>,
) -> Result<Json<Envelope<Student>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().set_advisor(&caller, id, body.advisor_id).await?))
}
