//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::sync::{Arc, Mutex};

use casebook_core::{
  crime::{Contact, Crime, UNNAMED_TITLE},
  feed::StoreEvent,
  projection::{ItemState, Projection, SortOrder},
  session::EditSession,
  store::CrimeStore,
};
use chrono::{Duration, Local};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sample(title: &str) -> Crime {
  let mut crime = Crime::with_title(title);
  crime.suspect = "Jane Doe".into();
  crime.suspect_phone = "555-0100".into();
  crime
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_roundtrip() {
  let s = store().await;
  let crime = sample("Stolen bike");

  let created = s.create(crime.clone()).await.unwrap();
  assert_eq!(created, crime);

  let fetched = s.get(crime.id).await.unwrap();
  assert_eq!(fetched, Some(crime));
}

#[tokio::test]
async fn solved_flag_and_blank_fields_roundtrip() {
  let s = store().await;
  let mut crime = Crime::new();
  crime.is_solved = true;

  s.create(crime.clone()).await.unwrap();
  let fetched = s.get(crime.id).await.unwrap().unwrap();
  assert!(fetched.is_solved);
  assert_eq!(fetched.title, "");
  assert_eq!(fetched.suspect, "");
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_create_is_rejected_and_keeps_original() {
  let s = store().await;
  let crime = sample("Original");
  s.create(crime.clone()).await.unwrap();

  let mut clash = crime.clone();
  clash.title = "Impostor".into();
  let err = s.create(clash).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateId(id) if id == crime.id));

  assert_eq!(s.get(crime.id).await.unwrap().unwrap().title, "Original");
  assert_eq!(s.count().await.unwrap(), 1);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_replaces_whole_record() {
  let s = store().await;
  let mut crime = s.create(sample("Before")).await.unwrap();

  crime.title = "After".into();
  crime.is_solved = true;
  crime.suspect.clear();
  crime.suspect_phone.clear();
  crime.date = crime.date - Duration::days(3);
  s.update(crime.clone()).await.unwrap();

  assert_eq!(s.get(crime.id).await.unwrap(), Some(crime));
}

#[tokio::test]
async fn update_missing_is_not_found_and_state_unchanged() {
  let s = store().await;
  let kept = s.create(sample("Kept")).await.unwrap();

  let err = s.update(sample("Ghost")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  assert_eq!(s.list_all().await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn rapid_updates_are_last_write_wins() {
  let s = store().await;
  let mut crime = s.create(Crime::new()).await.unwrap();

  for title in ["S", "St", "Sto", "Stol", "Stole", "Stolen"] {
    crime.title = title.into();
    s.update(crime.clone()).await.unwrap();
  }

  assert_eq!(s.get(crime.id).await.unwrap().unwrap().title, "Stolen");
}

#[tokio::test]
async fn concurrent_updates_leave_one_complete_record() {
  let s = store().await;
  let base = s.create(Crime::new()).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..16 {
    let s = s.clone();
    let mut crime = base.clone();
    handles.push(tokio::spawn(async move {
      crime.title = format!("title {i}");
      crime.suspect = format!("suspect {i}");
      s.update(crime).await
    }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  // Full-record replacement: title and suspect come from the same write.
  let stored = s.get(base.id).await.unwrap().unwrap();
  let n = stored.title.strip_prefix("title ").unwrap();
  assert_eq!(stored.suspect, format!("suspect {n}"));
}

// ─── Delete / list ───────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_idempotent() {
  let s = store().await;
  let crime = s.create(sample("Doomed")).await.unwrap();

  assert!(s.delete(crime.id).await.unwrap());
  assert!(!s.delete(crime.id).await.unwrap());
  assert!(s.get(crime.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_unknown_id_is_not_an_error() {
  let s = store().await;
  assert!(!s.delete(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn list_all_returns_every_record() {
  let s = store().await;
  let a = s.create(sample("A")).await.unwrap();
  let b = s.create(sample("B")).await.unwrap();
  let c = s.create(sample("C")).await.unwrap();
  s.delete(b.id).await.unwrap();

  let mut ids: Vec<_> = s.list_all().await.unwrap().into_iter().map(|c| c.id).collect();
  ids.sort();
  let mut expected = vec![a.id, c.id];
  expected.sort();
  assert_eq!(ids, expected);
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_reports_only_successful_writes() {
  let s = store().await;
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  let listener = s.changes().subscribe(move |e| sink.lock().unwrap().push(*e));

  let crime = s.create(sample("Watched")).await.unwrap();
  let _ = s.create(crime.clone()).await;
  s.update(crime.clone()).await.unwrap();
  let _ = s.update(sample("Ghost")).await;
  s.delete(crime.id).await.unwrap();
  s.delete(crime.id).await.unwrap();

  assert!(s.changes().unsubscribe(listener));
  s.create(sample("Unwatched")).await.unwrap();

  assert_eq!(
    *seen.lock().unwrap(),
    vec![
      StoreEvent::Created(crime.id),
      StoreEvent::Updated(crime.id),
      StoreEvent::Deleted(crime.id),
    ]
  );
}

#[tokio::test]
async fn clones_share_the_feed() {
  let s = store().await;
  let other = s.clone();
  let seen = Arc::new(Mutex::new(0usize));
  let sink = Arc::clone(&seen);
  s.changes().subscribe(move |_| *sink.lock().unwrap() += 1);

  other.create(Crime::new()).await.unwrap();
  assert_eq!(*seen.lock().unwrap(), 1);
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_survive_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("casebook.db");

  let crime = sample("Persistent");
  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create(crime.clone()).await.unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.get(crime.id).await.unwrap(), Some(crime));
}

// ─── Sessions and projections over SQLite ────────────────────────────────────

#[tokio::test]
async fn session_end_repairs_blank_title() {
  let s = Arc::new(store().await);
  let mut session = EditSession::create(Arc::clone(&s)).await.unwrap();
  let id = session.id();

  session.set_title("").await.unwrap();
  session.finish().await.unwrap();

  assert_eq!(s.get(id).await.unwrap().unwrap().title, UNNAMED_TITLE);
}

#[tokio::test]
async fn session_contact_pick_is_persisted() {
  let s = Arc::new(store().await);
  let created = s.create(Crime::with_title("Mugging")).await.unwrap();

  let mut session = EditSession::open(Arc::clone(&s), created.id)
    .await
    .unwrap()
    .expect("session opens");
  session
    .apply_contact(Contact::new("Jane Doe", ""))
    .await
    .unwrap();

  let stored = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(stored.suspect, "Jane Doe");
  assert!(!stored.can_contact_suspect());
}

#[tokio::test]
async fn session_blank_submit_maps_to_core_error() {
  let s = Arc::new(store().await);
  let mut session = EditSession::create(Arc::clone(&s)).await.unwrap();
  let err = session.submit().await.unwrap_err();
  assert!(matches!(err, Error::Core(casebook_core::Error::BlankTitle)));
}

#[tokio::test]
async fn projection_diff_after_edit() {
  let s = store().await;
  let now = Local::now();
  let mut a = sample("X");
  a.date = now;
  let mut b = sample("B");
  b.date = now - Duration::hours(1);
  s.create(a.clone()).await.unwrap();
  s.create(b.clone()).await.unwrap();

  let before = Projection::new(s.list_all().await.unwrap(), SortOrder::NewestFirst);
  a.title = "Y".into();
  s.update(a.clone()).await.unwrap();
  let after = Projection::new(s.list_all().await.unwrap(), SortOrder::NewestFirst);

  let diff = before.diff(&after);
  assert_eq!(diff.items[0].id, a.id);
  assert_eq!(diff.items[0].state, ItemState::Changed);
  assert_eq!(diff.items[1].id, b.id);
  assert_eq!(diff.items[1].state, ItemState::Unchanged);
}
