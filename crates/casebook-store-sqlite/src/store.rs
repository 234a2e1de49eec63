//! [`SqliteStore`] — the SQLite implementation of [`CrimeStore`].

use std::{path::Path, sync::Arc};

use casebook_core::{
  crime::Crime,
  feed::{ChangeFeed, StoreEvent},
  store::CrimeStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{CRIME_COLUMNS, CrimeParams, RawCrime, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Casebook crime store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection and the change feed are
/// reference-counted, so clones see each other's writes and events.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: Arc<ChangeFeed>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, feed: Arc::default() };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened crime store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, feed: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored crimes.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM crimes", [], |r| r.get(0))?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

// ─── CrimeStore impl ─────────────────────────────────────────────────────────

impl CrimeStore for SqliteStore {
  type Error = Error;

  async fn create(&self, crime: Crime) -> Result<Crime> {
    let p = CrimeParams::from(&crime);

    // Existence check and insert run in one closure on the connection
    // thread, so no other write can slip in between them.
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM crimes WHERE id = ?1",
            rusqlite::params![p.id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        if exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO crimes (id, title, date, is_solved, suspect, suspect_phone)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            p.id,
            p.title,
            p.date,
            p.is_solved,
            p.suspect,
            p.suspect_phone,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateId(crime.id));
    }

    tracing::debug!(id = %crime.id, "created crime");
    self.feed.publish(StoreEvent::Created(crime.id));
    Ok(crime)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Crime>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCrime> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CRIME_COLUMNS} FROM crimes WHERE id = ?1"),
            rusqlite::params![id_str],
            RawCrime::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCrime::into_crime).transpose()
  }

  async fn update(&self, crime: Crime) -> Result<Crime> {
    let p = CrimeParams::from(&crime);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE crimes
           SET title = ?2, date = ?3, is_solved = ?4,
               suspect = ?5, suspect_phone = ?6
           WHERE id = ?1",
          rusqlite::params![
            p.id,
            p.title,
            p.date,
            p.is_solved,
            p.suspect,
            p.suspect_phone,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound(crime.id));
    }

    tracing::debug!(id = %crime.id, "updated crime");
    self.feed.publish(StoreEvent::Updated(crime.id));
    Ok(crime)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM crimes WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if removed == 0 {
      tracing::debug!(%id, "delete of absent crime ignored");
      return Ok(false);
    }

    tracing::debug!(%id, "deleted crime");
    self.feed.publish(StoreEvent::Deleted(id));
    Ok(true)
  }

  async fn list_all(&self) -> Result<Vec<Crime>> {
    let raws: Vec<RawCrime> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {CRIME_COLUMNS} FROM crimes"))?;
        let rows = stmt
          .query_map([], RawCrime::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCrime::into_crime).collect()
  }

  fn changes(&self) -> &ChangeFeed { &self.feed }
}
