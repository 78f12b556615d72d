//! The cache-aside read path.
//!
//! Read the cache; on a hit return the stored bytes untouched. On a miss fetch
//! from the source, write the body back under the same key, and return it.
//! Nothing is retried here and concurrent misses on one key are not
//! deduplicated; both fetch and the last write wins.

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use reqwest::Url;
use roster_core::cache::CacheStore;

use crate::{Error, Result, upstream::Upstream};

/// Serve `key` from `cache`, falling back to `fetch` and caching its result
/// for `ttl`.
///
/// A failed cache read is logged and treated as a miss. A failed cache write
/// is an error even though the fetched body is in hand.
pub async fn cache_aside<C, F, Fut>(
  cache: &C,
  key:   &str,
  ttl:   Duration,
  fetch: F,
) -> Result<Bytes>
where
  C: CacheStore + ?Sized,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Bytes>>,
{
  if key.is_empty() {
    return Err(Error::EmptyKey);
  }
  if ttl.is_zero() {
    return Err(Error::ZeroTtl);
  }

  match cache.get(key).await {
    Ok(Some(hit)) => {
      tracing::debug!(key, "cache hit");
      return Ok(hit);
    }
    Ok(None) => tracing::debug!(key, "cache miss"),
    Err(e) => tracing::warn!(key, error = %e, "cache read failed, treating as miss"),
  }

  let body = fetch().await?;

  cache
    .set(key, body.clone(), ttl)
    .await
    .map_err(|e| Error::CacheWrite(Box::new(e)))?;

  Ok(body)
}

/// [`cache_aside`] bound to a shared cache and an HTTP upstream.
pub struct LookupClient<C, U> {
  cache:    Arc<C>,
  upstream: U,
}

impl<C, U> LookupClient<C, U>
where
  C: CacheStore,
  U: Upstream,
{
  pub fn new(cache: Arc<C>, upstream: U) -> Self { Self { cache, upstream } }

  /// Return the body cached under `key`, or GET `url` and cache it for `ttl`.
  pub async fn fetch(&self, key: &str, url: &Url, ttl: Duration) -> Result<Bytes> {
    cache_aside(self.cache.as_ref(), key, ttl, || self.upstream.get(url)).await
  }
}
