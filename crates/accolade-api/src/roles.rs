//! Handlers for `/roles` and `/permissions`. Administrators only.
//!
//! A grant or revoke changes what tokens issued afterwards carry; tokens
//! already issued keep their permission list until they expire.

use accolade_core::{
  identity::{Permission, Role},
  store::{DirectoryStore, DocumentStore},
};
use axum::extract::State;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, done, ok},
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /roles`
pub async fn list_roles<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<Role>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_roles(&caller).await?))
}

/// `GET /permissions`
pub async fn list_permissions<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<Permission>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_permissions(&caller).await?))
}

/// `POST /roles/{id}/permissions/{permission_id}`
pub async fn grant<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  state
    .people()
    .grant_permission(&caller, role_id, permission_id)
    .await?;
  Ok(done("permission granted"))
}

/// `DELETE /roles/{id}/permissions/{permission_id}`
pub async fn revoke<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  state
    .people()
    .revoke_permission(&caller, role_id, permission_id)
    .await?;
  Ok(done("permission revoked"))
}
