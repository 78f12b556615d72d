//! The `PersonStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-api`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  filter::{Listing, PersonQuery},
  person::{Person, PersonAttrs},
};

/// Backend errors must say whether they stem from a uniqueness constraint so
/// that callers can tell a conflict apart from a generic failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool;
}

impl Error {
  /// Classify a backend error as [`Error::Conflict`] or [`Error::Store`].
  pub fn from_store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      Error::Conflict(e.to_string())
    } else {
      Error::Store(Box::new(e))
    }
  }
}

/// Abstraction over a person record store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PersonStore: Send + Sync {
  type Error: StoreError;

  /// Persist a new person; the store assigns the identifier and timestamps.
  fn insert(
    &self,
    attrs: PersonAttrs,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Persist a person under a caller-supplied identifier (imports, replays).
  /// Fails with a conflict if the identifier is already taken.
  fn insert_with_id(
    &self,
    id: Uuid,
    attrs: PersonAttrs,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by identifier. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Replace every mutable attribute of an existing person. Returns `None` if
  /// the identifier does not exist.
  fn replace(
    &self,
    id: Uuid,
    attrs: PersonAttrs,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Delete by identifier and return the number of rows removed.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Run a filtered, paginated listing. `total` and the page come from the
  /// same snapshot.
  fn select<'a>(
    &'a self,
    query: &'a PersonQuery,
  ) -> impl Future<Output = Result<Listing, Self::Error>> + Send + 'a;
}
