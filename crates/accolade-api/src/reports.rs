//! Handlers for `/reports` endpoints.

use accolade_core::{
  achievement::StatusCount,
  service::{OrphanReport, StudentReport},
  store::{DirectoryStore, DocumentStore},
};
use axum::extract::State;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, ok},
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /reports/statistics`
pub async fn statistics<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<StatusCount>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.reports().statistics(&caller).await?))
}

/// `GET /reports/student/{id}`
pub async fn student<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<StudentReport>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.reports().student_statistics(&caller, id).await?))
}

/// `GET /reports/orphans`
pub async fn orphans<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<OrphanReport>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.reports().orphans(&caller).await?))
}
