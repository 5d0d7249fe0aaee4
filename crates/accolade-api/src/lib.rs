//! JSON REST API for the achievement tracker.
//!
//! Exposes an axum [`Router`] backed by any [`DirectoryStore`] and
//! [`DocumentStore`] pair. Every route except login and `/health` requires a
//! bearer token issued by [`token::TokenIssuer`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = accolade_api::router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod achievements;
pub mod auth;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod lecturers;
pub mod password;
pub mod reports;
pub mod roles;
pub mod students;
pub mod token;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use accolade_core::{
  service::{Achievements, Directory, Reports},
  store::{DirectoryStore, DocumentStore},
};
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};

pub use error::ApiError;
use token::TokenIssuer;

/// Largest accepted attachment request body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<R, D> {
  pub directory: Arc<R>,
  pub documents: Arc<D>,
  pub tokens:    Arc<TokenIssuer>,
  /// Directory attachment files are written to.
  pub uploads:   Arc<PathBuf>,
}

impl<R, D> Clone for AppState<R, D> {
  fn clone(&self) -> Self {
    Self {
      directory: self.directory.clone(),
      documents: self.documents.clone(),
      tokens:    self.tokens.clone(),
      uploads:   self.uploads.clone(),
    }
  }
}

impl<R, D> AppState<R, D>
where
  R: DirectoryStore,
  D: DocumentStore,
{
  pub fn new(directory: Arc<R>, documents: Arc<D>, tokens: TokenIssuer, uploads: PathBuf) -> Self {
    Self {
      directory,
      documents,
      tokens: Arc::new(tokens),
      uploads: Arc::new(uploads),
    }
  }

  pub fn achievements(&self) -> Achievements<R, D> {
    Achievements::new(self.directory.clone(), self.documents.clone())
  }

  pub fn people(&self) -> Directory<R> { Directory::new(self.directory.clone()) }

  pub fn reports(&self) -> Reports<R, D> {
    Reports::new(self.directory.clone(), self.documents.clone())
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: `/health` plus the versioned API under `/api/v1`.
pub fn router<R, D>(state: AppState<R, D>) -> Router<()>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api/v1", api_router(state))
}

async fn health() -> extract::Json<envelope::Envelope<()>> { envelope::done("ok") }

/// Every versioned route, relative to `/api/v1`.
pub fn api_router<R, D>(state: AppState<R, D>) -> Router<()>
where
  R: DirectoryStore + 'static,
  D: DocumentStore + 'static,
{
  Router::new()
    // Auth
    .route("/auth/login", post(auth::login::<R, D>))
    .route("/auth/profile", get(auth::profile::<R, D>))
    .route("/auth/refresh", post(auth::refresh::<R, D>))
    .route("/auth/logout", post(auth::logout))
    // Achievements
    .route(
      "/achievements",
      get(achievements::list::<R, D>).post(achievements::create::<R, D>),
    )
    .route(
      "/achievements/{id}",
      get(achievements::get_one::<R, D>)
        .put(achievements::update::<R, D>)
        .delete(achievements::delete::<R, D>),
    )
    .route("/achievements/{id}/submit", post(achievements::submit::<R, D>))
    .route("/achievements/{id}/verify", post(achievements::verify::<R, D>))
    .route("/achievements/{id}/reject", post(achievements::reject::<R, D>))
    .route("/achievements/{id}/history", get(achievements::history::<R, D>))
    .route(
      "/achievements/{id}/attachments",
      post(achievements::attach::<R, D>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
    // Users
    .route("/users", get(users::list::<R, D>).post(users::create::<R, D>))
    .route(
      "/users/{id}",
      get(users::get_one::<R, D>)
        .put(users::update::<R, D>)
        .delete(users::delete::<R, D>),
    )
    .route("/users/{id}/role", put(users::assign_role::<R, D>))
    // Students
    .route("/students", get(students::list::<R, D>).post(students::create::<R, D>))
    .route("/students/{id}", get(students::get_one::<R, D>))
    .route("/students/{id}/achievements", get(students::achievements::<R, D>))
    .route("/students/{id}/advisor", put(students::set_advisor::<R, D>))
    // Lecturers
    .route("/lecturers", get(lecturers::list::<R, D>).post(lecturers::create::<R, D>))
    .route("/lecturers/{id}", get(lecturers::get_one::<R, D>))
    .route("/lecturers/{id}/advisees", get(lecturers::advisees::<R, D>))
    // Roles and permissions
    .route("/roles", get(roles::list_roles::<R, D>))
    .route("/permissions", get(roles::list_permissions::<R, D>))
    .route(
      "/roles/{id}/permissions/{permission_id}",
      post(roles::grant::<R, D>).delete(roles::revoke::<R, D>),
    )
    // Reports
    .route("/reports/statistics", get(reports::statistics::<R, D>))
    .route("/reports/student/{id}", get(reports::student::<R, D>))
    .route("/reports/orphans", get(reports::orphans::<R, D>))
    .with_state(state)
}
