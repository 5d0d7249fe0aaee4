//! SQLite backends for the achievement tracker.
//!
//! [`SqliteStore`] holds the relational records and [`SqliteDocumentStore`]
//! holds achievement content as JSON documents. Each wraps its own
//! [`tokio_rusqlite`] connection, so the two stores never share a
//! transaction.

mod directory;
mod documents;
mod encode;
mod schema;

pub mod error;

pub use directory::SqliteStore;
pub use documents::SqliteDocumentStore;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
