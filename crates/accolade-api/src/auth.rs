//! Bearer-token extractor and the `/auth` handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"username":..,"password":..}`; public |
//! | `GET`  | `/auth/profile` | Stored user plus the token's role and permissions |
//! | `POST` | `/auth/refresh` | Re-reads role and permissions, new token |
//! | `POST` | `/auth/logout` | Stateless; the client drops the token |

use accolade_core::{
  Error,
  identity::User,
  principal::Principal,
  store::{DirectoryStore, DocumentStore},
};
use axum::{
  extract::{FromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  AppState,
  envelope::{Envelope, done, ok},
  error::ApiError,
  extract::Json,
  password::verify_password,
};

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The verified caller. Present in a handler means the bearer token was valid.
pub struct Authenticated(pub Principal);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl<R, D> FromRequestParts<AppState<R, D>> for Authenticated
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<R, D>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| Error::Unauthorized("missing bearer token".into()))?;
    Ok(Authenticated(state.tokens.verify(token)?))
  }
}

// ─── Session helpers ─────────────────────────────────────────────────────────

/// Role name and permission names for `user`, read from the store now.
async fn principal_for<R: DirectoryStore>(directory: &R, user: &User) -> Result<Principal, Error> {
  let role = directory
    .get_role(user.role_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found(format!("role {} not found", user.role_id)))?;
  let permissions = directory
    .permission_names_for_role(role.id)
    .await
    .map_err(Error::store)?;
  Ok(Principal { user_id: user.id, role: role.name, permissions })
}

fn ensure_active(user: &User) -> Result<(), Error> {
  if user.is_active {
    Ok(())
  } else {
    Err(Error::forbidden("account is inactive"))
  }
}

#[derive(Debug, Serialize)]
pub struct Session {
  pub token:       String,
  pub expires_at:  DateTime<Utc>,
  pub user:        User,
  pub role:        String,
  pub permissions: Vec<String>,
}

async fn open_session<R, D>(state: &AppState<R, D>, user: User) -> Result<Session, Error>
where
  R: DirectoryStore,
  D: DocumentStore,
{
  let principal = principal_for(state.directory.as_ref(), &user).await?;
  let issued = state.tokens.issue(&principal)?;
  Ok(Session {
    token: issued.token,
    expires_at: issued.expires_at,
    user,
    role: principal.role,
    permissions: principal.permissions,
  })
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<R, D>(
  State(state): State<AppState<R, D>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Envelope<Session>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  if body.username.trim().is_empty() || body.password.is_empty() {
    return Err(Error::validation("username and password are required").into());
  }

  let user = state
    .directory
    .get_user_by_username(&body.username)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found(format!("user {:?} not found", body.username)))?;
  ensure_active(&user)?;

  let hash = user.password_hash.clone();
  let matches = tokio::task::spawn_blocking(move || verify_password(&body.password, &hash))
    .await
    .map_err(Error::store)?;
  if !matches {
    return Err(Error::Unauthorized("invalid credentials".into()).into());
  }

  let session = open_session(&state, user).await?;
  info!(user = %session.user.id, role = %session.role, "login");
  Ok(ok(session))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Profile {
  pub user:        User,
  pub role:        String,
  pub permissions: Vec<String>,
}

/// `GET /auth/profile`
pub async fn profile<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Profile>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  let user = state
    .directory
    .get_user(caller.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found(format!("user {} not found", caller.user_id)))?;
  Ok(ok(Profile { user, role: caller.role, permissions: caller.permissions }))
}

// ─── Refresh / logout ────────────────────────────────────────────────────────

/// `POST /auth/refresh`
pub async fn refresh<R, D>(
  State(state): State<AppState<R, D>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Envelope<Session>>, ApiError>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  let user = state
    .directory
    .get_user(caller.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found(format!("user {} not found", caller.user_id)))?;
  ensure_active(&user)?;

  let session = open_session(&state, user).await?;
  info!(user = %session.user.id, "token refreshed");
  Ok(ok(session))
}

/// `POST /auth/logout`. Tokens are not tracked server side.
pub async fn logout(Authenticated(caller): Authenticated) -> Json<Envelope<()>> {
  info!(user = %caller.user_id, "logout");
  done("logged out")
}
