//! [`MemoryStore`]: a non-durable [`CrimeStore`] for tests and scratch use.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::{
  Error, Result,
  crime::Crime,
  feed::{ChangeFeed, StoreEvent},
  store::CrimeStore,
};

/// An in-process store keyed by crime id.
///
/// Cloning is cheap and clones share the same records and feed. The mutex
/// serialises writers, which gives the same last-write-wins ordering as the
/// SQLite backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  crimes: Arc<Mutex<HashMap<Uuid, Crime>>>,
  feed:   Arc<ChangeFeed>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Seed a store with existing records; no events are published.
  pub fn with_crimes(crimes: impl IntoIterator<Item = Crime>) -> Self {
    let store = Self::new();
    store
      .lock()
      .extend(crimes.into_iter().map(|c| (c.id, c)));
    store
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Crime>> {
    self.crimes.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CrimeStore for MemoryStore {
  type Error = Error;

  async fn create(&self, crime: Crime) -> Result<Crime> {
    {
      let mut crimes = self.lock();
      if crimes.contains_key(&crime.id) {
        return Err(Error::DuplicateId(crime.id));
      }
      crimes.insert(crime.id, crime.clone());
    }
    self.feed.publish(StoreEvent::Created(crime.id));
    Ok(crime)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Crime>> {
    Ok(self.lock().get(&id).cloned())
  }

  async fn update(&self, crime: Crime) -> Result<Crime> {
    {
      let mut crimes = self.lock();
      let Some(slot) = crimes.get_mut(&crime.id) else {
        return Err(Error::NotFound(crime.id));
      };
      *slot = crime.clone();
    }
    self.feed.publish(StoreEvent::Updated(crime.id));
    Ok(crime)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let removed = self.lock().remove(&id).is_some();
    if removed {
      self.feed.publish(StoreEvent::Deleted(id));
    }
    Ok(removed)
  }

  async fn list_all(&self) -> Result<Vec<Crime>> {
    Ok(self.lock().values().cloned().collect())
  }

  fn changes(&self) -> &ChangeFeed { &self.feed }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn create_then_get_returns_equal_record() {
    let store = MemoryStore::new();
    let crime = Crime::with_title("Stolen bike");
    let created = store.create(crime.clone()).await.unwrap();
    assert_eq!(created, crime);
    assert_eq!(store.get(crime.id).await.unwrap(), Some(crime));
  }

  #[tokio::test]
  async fn duplicate_create_keeps_original() {
    let store = MemoryStore::new();
    let crime = Crime::with_title("First");
    store.create(crime.clone()).await.unwrap();

    let mut clash = crime.clone();
    clash.title = "Second".into();
    let err = store.create(clash).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateId(id) if id == crime.id));
    assert_eq!(store.get(crime.id).await.unwrap().unwrap().title, "First");
  }

  #[tokio::test]
  async fn update_missing_is_not_found_and_changes_nothing() {
    let existing = Crime::with_title("Kept");
    let store = MemoryStore::with_crimes([existing.clone()]);

    let err = store.update(Crime::with_title("Ghost")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(store.list_all().await.unwrap(), vec![existing]);
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let crime = Crime::with_title("Gone");
    let store = MemoryStore::with_crimes([crime.clone()]);
    assert!(store.delete(crime.id).await.unwrap());
    assert!(!store.delete(crime.id).await.unwrap());
    assert!(store.get(crime.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn events_follow_successful_writes_only() {
    let store = MemoryStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.changes().subscribe(move |e| sink.lock().unwrap().push(*e));

    let crime = store.create(Crime::new()).await.unwrap();
    store.update(crime.clone()).await.unwrap();
    let _ = store.update(Crime::new()).await;
    store.delete(crime.id).await.unwrap();
    store.delete(crime.id).await.unwrap();

    assert_eq!(
      *seen.lock().unwrap(),
      vec![
        StoreEvent::Created(crime.id),
        StoreEvent::Updated(crime.id),
        StoreEvent::Deleted(crime.id),
      ]
    );
  }
}
