//! Edit sessions: one editor's working copy of one crime.
//!
//! A session never mutates store-owned state. It edits its own copy and
//! writes the full record back through [`CrimeStore::update`] after every
//! change, so the store always holds the latest edit.

use std::{path::PathBuf, sync::Arc};

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
  crime::{Contact, Crime, resolve_local},
  photo::PhotoStore,
  store::CrimeStore,
};

/// A working copy of a crime bound to the store it came from.
///
/// End every session with [`EditSession::finish`]; that is where a blank
/// title gets its default before the final save.
pub struct EditSession<S: CrimeStore> {
  store: Arc<S>,
  crime: Crime,
}

impl<S: CrimeStore> EditSession<S> {
  /// Persist a fresh, blank crime and start editing it.
  pub async fn create(store: Arc<S>) -> Result<Self, S::Error> {
    let crime = store.create(Crime::new()).await?;
    tracing::debug!(id = %crime.id, "started session on new crime");
    Ok(Self { store, crime })
  }

  /// Start editing the stored crime `id`. Returns `None` if it no longer
  /// exists.
  pub async fn open(store: Arc<S>, id: Uuid) -> Result<Option<Self>, S::Error> {
    let Some(crime) = store.get(id).await? else {
      tracing::warn!(%id, "crime vanished before its session opened");
      return Ok(None);
    };
    Ok(Some(Self { store, crime }))
  }

  pub fn id(&self) -> Uuid { self.crime.id }

  /// The working copy, which matches the store after every successful edit.
  pub fn crime(&self) -> &Crime { &self.crime }

  pub fn report_text(&self) -> String { self.crime.report_text() }

  pub fn photo_path(&self, photos: &PhotoStore) -> PathBuf { photos.path(self.crime.id) }

  // ── Field edits ───────────────────────────────────────────────────────────

  /// Blank titles are accepted here; they are repaired by
  /// [`EditSession::finish`].
  pub async fn set_title(&mut self, title: impl Into<String>) -> Result<(), S::Error> {
    self.crime.title = title.into();
    self.commit().await
  }

  pub async fn set_solved(&mut self, solved: bool) -> Result<(), S::Error> {
    self.crime.is_solved = solved;
    self.commit().await
  }

  /// Move the crime to another calendar day, keeping its time of day.
  pub async fn set_date(&mut self, date: NaiveDate) -> Result<(), S::Error> {
    let naive = date.and_time(self.crime.date.time());
    self.crime.date =
      resolve_local(naive).ok_or(crate::Error::NonexistentLocalTime(naive))?;
    self.commit().await
  }

  /// Set the time of day, keeping the calendar day. Seconds are zeroed.
  pub async fn set_time(&mut self, hour: u32, minute: u32) -> Result<(), S::Error> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
      .ok_or(crate::Error::InvalidTime { hour, minute })?;
    let naive = self.crime.date.date_naive().and_time(time);
    self.crime.date =
      resolve_local(naive).ok_or(crate::Error::NonexistentLocalTime(naive))?;
    self.commit().await
  }

  /// Take suspect name and phone from a picked contact, as one change.
  pub async fn apply_contact(&mut self, contact: Contact) -> Result<(), S::Error> {
    self.crime.suspect = contact.display_name;
    self.crime.suspect_phone = contact.phone;
    self.commit().await
  }

  pub async fn clear_suspect(&mut self) -> Result<(), S::Error> {
    self.crime.suspect.clear();
    self.crime.suspect_phone.clear();
    self.commit().await
  }

  // ── Saving ────────────────────────────────────────────────────────────────

  /// Write the working copy back to the store.
  ///
  /// Fails with the store's not-found error if the crime was deleted while
  /// the session was open.
  pub async fn commit(&mut self) -> Result<(), S::Error> {
    self.crime = self.store.update(self.crime.clone()).await?;
    tracing::debug!(id = %self.crime.id, "session persisted crime");
    Ok(())
  }

  /// Save only if the crime has a title; otherwise fail with
  /// [`crate::Error::BlankTitle`] and leave the session open.
  pub async fn submit(&mut self) -> Result<(), S::Error> {
    if !self.crime.is_valid_for_persistence() {
      return Err(crate::Error::BlankTitle.into());
    }
    self.commit().await
  }

  /// End the session: give a blank title its default, save, and hand back
  /// the final record.
  pub async fn finish(mut self) -> Result<Crime, S::Error> {
    if self.crime.repair_title() {
      tracing::debug!(id = %self.crime.id, "defaulted blank title on session end");
    }
    self.commit().await?;
    Ok(self.crime)
  }
}
