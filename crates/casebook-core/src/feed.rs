//! Change notifications from a store to whoever presents its records.
//!
//! Listeners are registered and removed explicitly. A store publishes an
//! event only after the corresponding write has been persisted.

use std::{
  fmt,
  sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Events ──────────────────────────────────────────────────────────────────

/// A successful write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StoreEvent {
  Created(Uuid),
  Updated(Uuid),
  Deleted(Uuid),
}

impl StoreEvent {
  /// The id of the crime the event concerns.
  pub fn id(&self) -> Uuid {
    match self {
      Self::Created(id) | Self::Updated(id) | Self::Deleted(id) => *id,
    }
  }
}

// ─── Feed ────────────────────────────────────────────────────────────────────

/// Handle returned by [`ChangeFeed::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// A registry of change listeners owned by a store.
#[derive(Default)]
pub struct ChangeFeed {
  next_id:   AtomicU64,
  listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl fmt::Debug for ChangeFeed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChangeFeed")
      .field("listeners", &self.len())
      .finish()
  }
}

impl ChangeFeed {
  pub fn new() -> Self { Self::default() }

  /// Register `listener`; it is called once per published event until
  /// unsubscribed.
  pub fn subscribe<F>(&self, listener: F) -> ListenerId
  where
    F: Fn(&StoreEvent) + Send + Sync + 'static,
  {
    let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
    self
      .listeners
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push((id, Arc::new(listener)));
    id
  }

  /// Remove a listener. Returns `false` if it was not registered.
  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    let mut listeners =
      self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
    let before = listeners.len();
    listeners.retain(|(lid, _)| *lid != id);
    listeners.len() != before
  }

  /// Number of registered listeners.
  pub fn len(&self) -> usize {
    self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Deliver `event` to every listener registered at the time of the call.
  ///
  /// The registry lock is released before any listener runs, so listeners
  /// may subscribe or unsubscribe from inside the callback.
  pub fn publish(&self, event: StoreEvent) {
    let snapshot: Vec<Listener> = self
      .listeners
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .map(|(_, l)| Arc::clone(l))
      .collect();

    tracing::trace!(?event, listeners = snapshot.len(), "publishing store event");
    for listener in snapshot {
      listener(&event);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  #[test]
  fn subscribers_receive_events_in_order() {
    let feed = ChangeFeed::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    feed.subscribe(move |e| sink.lock().unwrap().push(*e));

    let id = Uuid::new_v4();
    feed.publish(StoreEvent::Created(id));
    feed.publish(StoreEvent::Updated(id));

    assert_eq!(
      *seen.lock().unwrap(),
      vec![StoreEvent::Created(id), StoreEvent::Updated(id)]
    );
  }

  #[test]
  fn unsubscribed_listener_stops_receiving() {
    let feed = ChangeFeed::new();
    let count = Arc::new(AtomicU64::new(0));
    let c = Arc::clone(&count);
    let id = feed.subscribe(move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });

    feed.publish(StoreEvent::Deleted(Uuid::new_v4()));
    assert!(feed.unsubscribe(id));
    assert!(!feed.unsubscribe(id));
    feed.publish(StoreEvent::Deleted(Uuid::new_v4()));

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(feed.is_empty());
  }

  #[test]
  fn listener_may_unsubscribe_itself() {
    let feed = Arc::new(ChangeFeed::new());
    let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

    let f = Arc::clone(&feed);
    let s = Arc::clone(&slot);
    let id = feed.subscribe(move |_| {
      if let Some(id) = s.lock().unwrap().take() {
        f.unsubscribe(id);
      }
    });
    *slot.lock().unwrap() = Some(id);

    feed.publish(StoreEvent::Created(Uuid::new_v4()));
    assert!(feed.is_empty());
  }

  #[test]
  fn event_id_matches_payload() {
    let id = Uuid::new_v4();
    assert_eq!(StoreEvent::Updated(id).id(), id);
  }
}
