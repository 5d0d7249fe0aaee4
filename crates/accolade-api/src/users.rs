//! Handlers for `/users` endpoints. Administrators only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/users` | |
//! | `POST`   | `/users` | Password is hashed before storage |
//! | `GET`    | `/users/{id}` | |
//! | `PUT`    | `/users/{id}` | Every field except the role |
//! | `DELETE` | `/users/{id}` | Hard delete |
//! | `PUT`    | `/users/{id}/role` | Body: `{"role_id":"..."}` |

use accolade_core::{
  identity::{NewUser, User, UserChanges},
  policy::{Action, Resource},
  store::{DirectoryStore, DocumentStore},
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  envelope::{Envelope, created, done, ok},
  error::ApiError,
  extract::{Json, Path},
  password::hash_password_blocking,
};

fn default_true() -> bool { true }

/// `GET /users`
pub async fn list<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Vec<User>>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().list_users(&caller).await?))
}

/// `GET /users/{id}`
pub async fn get_one<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<User>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().get_user(&caller, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username:  String,
  #[serde(default)]
  pub email:     String,
  pub password:  String,
  #[serde(default)]
  pub full_name: String,
  pub role_id:   Uuid,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

/// `POST /users`
pub async fn create<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Envelope<User>>), ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  // Deny before hashing.
  caller.authorize(Resource::User, Action::Create)?;
  let password_hash = hash_password_blocking(body.password).await?;
  let user = state
    .people()
    .create_user(&caller, NewUser {
      username: body.username,
      email: body.email,
      password_hash,
      full_name: body.full_name,
      role_id: body.role_id,
      is_active: body.is_active,
    })
    .await?;
  Ok(created(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub username:  String,
  #[serde(default)]
  pub email:     String,
  #[serde(default)]
  pub full_name: String,
  #[serde(default = "default_true")]
  pub is_active: bool,
  /// Rehashed and replaced when present and non-empty.
  #[serde(default)]
  pub password:  Option<String>,
}

/// `PUT /users/{id}`
pub async fn update<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Envelope<User>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  caller.authorize(Resource::User, Action::Update)?;
  let password_hash = match body.password.filter(|p| !p.is_empty()) {
    Some(password) => Some(hash_password_blocking(password).await?),
    None => None,
  };
  let user = state
    .people()
    .update_user(&caller, id, UserChanges {
      username: body.username,
      email: body.email,
      full_name: body.full_name,
      is_active: body.is_active,
      password_hash,
    })
    .await?;
  Ok(ok(user))
}

/// `DELETE /users/{id}`
pub async fn delete<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  state.people().delete_user(&caller, id).await?;
  Ok(done(format!("user {id} deleted")))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role_id: Uuid,
}

/// `PUT /users/{id}/role`
pub async fn assign_role<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<RoleBody>,
) -> Result<Json<Envelope<User>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Ok(ok(state.people().assign_role(&caller, id, body.role_id).await?))
}
