//! Handlers for `/lecturers` endpoints.

use accolade_core::{
  academic::{Lecturer, NewLecturer, Student},
  store::{DirectoryStore, DocumentStore},
};
use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, created, ok},
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /lecturers`
pub async fn list<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<Lecturer>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_lecturers(&caller).await?))
}

/// `POST /lecturers`
pub async fn create<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewLecturer>,
) -> Result<(StatusCode, Json<Envelope<Lecturer>>), ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(created(state.people().create_lecturer(&caller, body).await?))
}

/// `GET /lecturers/{id}`
pub async fn get_one<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Lecturer>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().get_lecturer(&caller, id).await?))
}

/// `GET /lecturers/{id}/advisees`
pub async fn advisees<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<Student>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_advisees(&caller, id).await?))
}
