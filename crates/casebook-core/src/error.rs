//! Error types for `casebook-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("crime not found: {0}")]
  NotFound(Uuid),

  #[error("crime {0} already exists")]
  DuplicateId(Uuid),

  /// Raised only by an explicit submit; ordinary saves accept blank titles.
  #[error("a crime needs a title before it can be submitted")]
  BlankTitle,

  #[error("invalid time of day: {hour:02}:{minute:02}")]
  InvalidTime { hour: u32, minute: u32 },

  #[error("{0} does not exist in the local time zone")]
  NonexistentLocalTime(chrono::NaiveDateTime),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
