//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] over a [`PeopleService`], which is generic over
//! the person store, the lookup cache and the lookup upstream. TLS, auth and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = roster_api::api_router(Arc::new(service)).layer(TraceLayer::new_for_http());
//! ```

pub mod error;
pub mod people;
pub mod service;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::{cache::CacheStore, store::PersonStore};
use roster_enrich::Upstream;

pub use error::ApiError;
pub use service::PeopleService;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C, U>(service: Arc<PeopleService<S, C, U>>) -> Router<()>
where
  S: PersonStore + 'static,
  C: CacheStore + 'static,
  U: Upstream + 'static,
{
  Router::new()
    .route("/people", get(people::list::<S, C, U>).post(people::create::<S, C, U>))
    .route(
      "/people/{id}",
      get(people::get_one::<S, C, U>)
        .put(people::update_one::<S, C, U>)
        .delete(people::delete_one::<S, C, U>),
    )
    .with_state(service)
}

#[cfg(test)]
mod tests;
