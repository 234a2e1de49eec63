//! The `CrimeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `casebook-store-sqlite`
//! and [`crate::memory::MemoryStore`]). Higher layers depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{crime::Crime, feed::ChangeFeed};

/// Abstraction over a durable, keyed crime store.
///
/// Every mutating method has persisted its write by the time the returned
/// future resolves, and only then publishes a [`crate::feed::StoreEvent`] on
/// [`CrimeStore::changes`]. Writes to the same id are applied in call order,
/// last write wins.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CrimeStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Insert a new crime. Fails if a crime with the same id already exists;
  /// the existing record is never overwritten.
  fn create(
    &self,
    crime: Crime,
  ) -> impl Future<Output = Result<Crime, Self::Error>> + Send + '_;

  /// Retrieve a crime by id. Returns `None` if not found, which callers must
  /// treat as an ordinary outcome (the record may have just been deleted).
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Crime>, Self::Error>> + Send + '_;

  /// Replace the stored crime with the same id. Fails if there is none.
  fn update(
    &self,
    crime: Crime,
  ) -> impl Future<Output = Result<Crime, Self::Error>> + Send + '_;

  /// Remove a crime. Idempotent: returns `false`, not an error, when there
  /// was nothing to remove.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every stored crime, in no particular order.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Crime>, Self::Error>> + Send + '_;

  /// The feed on which this store announces successful writes.
  fn changes(&self) -> &ChangeFeed;
}
