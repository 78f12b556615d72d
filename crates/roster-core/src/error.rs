//! Error types for `roster-core`.
//!
//! [`Error`] is the closed set of failures the record lifecycle can surface.
//! Callers branch on the variant, never on the message.

use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;
use uuid::Uuid;

use crate::validate::Violations;

/// The enrichment lookup a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  Age,
  Gender,
  Nationality,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(Violations),

  #[error("person not found: {0}")]
  NotFound(Uuid),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("{category} lookup failed: {source}")]
  Lookup {
    category: Category,
    #[source]
    source:   Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Short machine-readable tag for the variant.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::NotFound(_) => "not_found",
      Self::Conflict(_) => "conflict",
      Self::Lookup { .. } => "external_service",
      Self::Store(_) => "internal",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
