//! Error type for `roster-store-sqlite`.

use roster_core::store::StoreError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown gender in database: {0:?}")]
  Gender(String),

  #[error("ttl out of range: {0}")]
  Ttl(String),
}

impl StoreError for Error {
  /// Primary-key and UNIQUE violations; CHECK failures are not conflicts.
  fn is_conflict(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        matches!(
          e.extended_code,
          ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        )
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
