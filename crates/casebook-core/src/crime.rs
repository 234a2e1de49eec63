//! The crime record: the only entity in the store.
//!
//! A crime carries its own validation and derivation rules. None of them
//! touch storage; they are pure functions of the record.

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title substituted for a blank one when an edit session ends.
pub const UNNAMED_TITLE: &str = "Unnamed crime";

/// Subject line to accompany [`Crime::report_text`] when it is shared.
pub const REPORT_SUBJECT: &str = "CriminalIntent Crime Report";

/// `strftime` pattern for the date inside a report, e.g.
/// `Tue, Mar 5, 2024, 09:41`.
pub const REPORT_DATE_FORMAT: &str = "%a, %b %-d, %Y, %I:%M";

// ─── Crime ───────────────────────────────────────────────────────────────────

/// One case entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crime {
  /// Assigned at creation and never changed; the join key for photos.
  pub id:            Uuid,
  pub title:         String,
  /// When the crime happened, in local wall-clock time.
  pub date:          DateTime<Local>,
  pub is_solved:     bool,
  /// Display name of the suspect; empty means no suspect.
  pub suspect:       String,
  /// Only meaningful while `suspect` is non-empty.
  pub suspect_phone: String,
}

impl Default for Crime {
  fn default() -> Self { Self::new() }
}

impl Crime {
  /// A fresh record: new id, current time, every other field empty.
  pub fn new() -> Self {
    Self {
      id:            Uuid::new_v4(),
      title:         String::new(),
      date:          Local::now(),
      is_solved:     false,
      suspect:       String::new(),
      suspect_phone: String::new(),
    }
  }

  /// Convenience constructor for a fresh record with a title.
  pub fn with_title(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::new() }
  }

  /// True when the title is non-blank.
  ///
  /// Blank titles are still accepted by every store write; this only tells
  /// the caller whether [`Crime::repair_title`] is due.
  pub fn is_valid_for_persistence(&self) -> bool {
    !self.title.trim().is_empty()
  }

  /// Replace a blank title with [`UNNAMED_TITLE`]. Returns `true` if the
  /// title was changed.
  pub fn repair_title(&mut self) -> bool {
    if self.is_valid_for_persistence() {
      return false;
    }
    self.title = UNNAMED_TITLE.to_owned();
    true
  }

  /// Whether the suspect has a name.
  pub fn has_suspect(&self) -> bool { !self.suspect.trim().is_empty() }

  /// Whether a "contact suspect" action can be offered: a named suspect with
  /// a number to dial.
  pub fn can_contact_suspect(&self) -> bool {
    self.has_suspect() && !self.suspect_phone.trim().is_empty()
  }

  /// `tel:` URI for the suspect's phone, when contacting is possible.
  pub fn dial_uri(&self) -> Option<String> {
    self
      .can_contact_suspect()
      .then(|| format!("tel:{}", self.suspect_phone.trim()))
  }

  /// Plain-text summary for sharing.
  pub fn report_text(&self) -> String {
    let solved = if self.is_solved {
      "The case is solved"
    } else {
      "The case is not solved"
    };

    let suspect = if self.has_suspect() {
      format!("the suspect is {}.", self.suspect)
    } else {
      "there is no suspect.".to_owned()
    };

    format!(
      "{}! The crime was discovered on {}. {solved}, and {suspect}",
      self.title,
      self.date.format(REPORT_DATE_FORMAT),
    )
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A contact picked by the user, as returned by whatever address book the
/// front end talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub display_name: String,
  pub phone:        String,
}

impl Contact {
  pub fn new(display_name: impl Into<String>, phone: impl Into<String>) -> Self {
    Self { display_name: display_name.into(), phone: phone.into() }
  }
}

// ─── Local time helpers ──────────────────────────────────────────────────────

/// Resolve a wall-clock time in the local zone.
///
/// Ambiguous times (a DST fold) take the earlier instant. Returns `None` for
/// times skipped by a DST gap.
pub fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
  match Local.from_local_datetime(&naive) {
    LocalResult::Single(dt) => Some(dt),
    LocalResult::Ambiguous(earliest, _) => Some(earliest),
    LocalResult::None => None,
  }
}
