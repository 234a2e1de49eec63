//! Error type for `casebook-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] casebook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to update a crime that is not in the store.
  #[error("crime not found: {0}")]
  NotFound(uuid::Uuid),

  #[error("crime {0} already exists")]
  DuplicateId(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
