//! Error type for `roster-enrich`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("lookup key must not be empty")]
  EmptyKey,

  #[error("cache ttl must be greater than zero")]
  ZeroTtl,

  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("{url} responded with status {status}")]
  Status { url: String, status: u16 },

  #[error("cache write failed: {0}")]
  CacheWrite(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected payload: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
