//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as RFC 3339 strings carrying the local offset they were
//! recorded with. UUIDs are stored as hyphenated lowercase strings.

use casebook_core::crime::Crime;
use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Local> ──────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Local>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Local>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Local))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` that feeds [`RawCrime::from_row`].
pub const CRIME_COLUMNS: &str =
  "id, title, date, is_solved, suspect, suspect_phone";

/// Raw values read directly from a `crimes` row.
pub struct RawCrime {
  pub id:            String,
  pub title:         String,
  pub date:          String,
  pub is_solved:     bool,
  pub suspect:       String,
  pub suspect_phone: String,
}

impl RawCrime {
  /// Read a row selected with [`CRIME_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      title:         row.get(1)?,
      date:          row.get(2)?,
      is_solved:     row.get(3)?,
      suspect:       row.get(4)?,
      suspect_phone: row.get(5)?,
    })
  }

  pub fn into_crime(self) -> Result<Crime> {
    Ok(Crime {
      id:            decode_uuid(&self.id)?,
      title:         self.title,
      date:          decode_dt(&self.date)?,
      is_solved:     self.is_solved,
      suspect:       self.suspect,
      suspect_phone: self.suspect_phone,
    })
  }
}

/// Owned column values for an `INSERT` or `UPDATE`, ready to move into a
/// connection closure.
pub struct CrimeParams {
  pub id:            String,
  pub title:         String,
  pub date:          String,
  pub is_solved:     bool,
  pub suspect:       String,
  pub suspect_phone: String,
}

impl From<&Crime> for CrimeParams {
  fn from(crime: &Crime) -> Self {
    Self {
      id:            encode_uuid(crime.id),
      title:         crime.title.clone(),
      date:          encode_dt(crime.date),
      is_solved:     crime.is_solved,
      suspect:       crime.suspect.clone(),
      suspect_phone: crime.suspect_phone.clone(),
    }
  }
}
