//! [`SqliteCache`]: a [`CacheStore`] over the `lookup_cache` table.

use std::time::Duration;

use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use rusqlite::OptionalExtension as _;
use roster_core::cache::CacheStore;

use crate::{Error, Result, encode::encode_dt, store::SqliteStore};

/// Lookup cache sharing the connection of the [`SqliteStore`] it came from.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteCache {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// A cache handle backed by this store's `lookup_cache` table.
  pub fn lookup_cache(&self) -> SqliteCache { SqliteCache { conn: self.conn.clone() } }
}

impl CacheStore for SqliteCache {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Bytes>> {
    let key_str = key.to_owned();
    let now_str = encode_dt(Utc::now());

    let value: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM lookup_cache WHERE cache_key = ?1 AND expires_at > ?2",
              rusqlite::params![key_str, now_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(value.map(Bytes::from))
  }

  async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
    let expires_at = TimeDelta::from_std(ttl)
      .ok()
      .and_then(|ttl| Utc::now().checked_add_signed(ttl))
      .ok_or_else(|| Error::Ttl(format!("{ttl:?}")))?;

    let key_str     = key.to_owned();
    let expires_str = encode_dt(expires_at);
    let now_str     = encode_dt(Utc::now());

    let swept = self
      .conn
      .call(move |conn| {
        // Rows for names never looked up again would otherwise linger.
        let swept = conn.execute(
          "DELETE FROM lookup_cache WHERE expires_at <= ?1",
          rusqlite::params![now_str],
        )?;
        conn.execute(
          "INSERT INTO lookup_cache (cache_key, value, expires_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (cache_key) DO UPDATE
             SET value = excluded.value, expires_at = excluded.expires_at",
          rusqlite::params![key_str, &value[..], expires_str],
        )?;
        Ok(swept)
      })
      .await?;

    if swept > 0 {
      tracing::debug!(swept, "expired lookup cache rows removed");
    }
    Ok(())
  }
}
