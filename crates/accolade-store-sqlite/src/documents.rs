//! [`SqliteDocumentStore`]: achievement content as JSON bodies.

use std::{path::Path, time::Duration};

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use accolade_core::{achievement::AchievementDocument, store::DocumentStore};

use crate::{
  Result,
  encode::{decode_uuid, encode_dt, encode_uuid},
  schema::DOCUMENT_SCHEMA,
};

/// Document store on its own SQLite database, separate from
/// [`crate::SqliteStore`].
#[derive(Clone)]
pub struct SqliteDocumentStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDocumentStore {
  pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(Duration::from_secs(5)).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(DOCUMENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_body(&self, id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(id);
    let body = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT body FROM achievements WHERE id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(body)
  }

  async fn write_body(&self, document: &AchievementDocument) -> Result<bool> {
    let id_str = encode_uuid(document.id);
    let body = serde_json::to_string(document)?;
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE achievements SET body = ?2 WHERE id = ?1",
          rusqlite::params![id_str, body],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}

impl DocumentStore for SqliteDocumentStore {
  type Error = crate::Error;

  async fn insert_document(&self, document: AchievementDocument) -> Result<()> {
    let id_str = encode_uuid(document.id);
    let student_str = encode_uuid(document.student_id);
    let at_str = encode_dt(document.created_at);
    let body = serde_json::to_string(&document)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO achievements (id, student_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, student_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<AchievementDocument>> {
    match self.read_body(id).await? {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn replace_document(&self, document: AchievementDocument) -> Result<bool> {
    self.write_body(&document).await
  }

  /// Appended in place with `json_insert`, so concurrent uploads to the same
  /// document do not overwrite each other.
  async fn push_attachment(&self, id: Uuid, filename: String) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE achievements
           SET body = json_insert(body, '$.attachments[#]', ?2)
           WHERE id = ?1",
          rusqlite::params![id_str, filename],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_document_ids(&self) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM achievements ORDER BY created_at")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }
}
