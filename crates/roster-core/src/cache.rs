//! The `CacheStore` trait: a byte-oriented key/value store with expiry.

use std::{future::Future, time::Duration};

use bytes::Bytes;

/// A key/value store whose entries expire `ttl` after they are written.
///
/// Values are opaque bytes and are returned exactly as written. Expired
/// entries must read as absent. Each `set` is atomic per key; concurrent
/// writers to one key resolve as last-write-wins.
pub trait CacheStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the live value for `key`, or `None` if absent or expired.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous entry.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Bytes,
    ttl: Duration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
