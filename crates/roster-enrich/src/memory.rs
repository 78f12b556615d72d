//! An in-process [`CacheStore`] with per-entry expiry.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{Mutex, PoisonError},
  time::Duration,
};

use bytes::Bytes;
use roster_core::cache::CacheStore;
use tokio::time::Instant;

struct Entry {
  value:      Bytes,
  expires_at: Instant,
}

/// A `HashMap`-backed cache. Expired entries are dropped when read and swept
/// on every write.
///
/// Uses the tokio clock, so paused-time tests can step past a ttl.
#[derive(Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  /// Number of entries held, expired or not.
  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl CacheStore for MemoryCache {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<Bytes>, Infallible> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    match entries.get(key) {
      Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
      Some(_) => {
        entries.remove(key);
        Ok(None)
      }
      None => Ok(None),
    }
  }

  async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Infallible> {
    let now = Instant::now();
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.retain(|_, entry| entry.expires_at > now);
    entries.insert(key.to_owned(), Entry { value, expires_at: now + ttl });
    Ok(())
  }
}
