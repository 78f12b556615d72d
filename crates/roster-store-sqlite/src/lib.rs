//! SQLite backend for the Roster person registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements
//! [`roster_core::store::PersonStore`]; [`SqliteCache`] implements
//! [`roster_core::cache::CacheStore`] over the same file.

mod cache;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use cache::SqliteCache;
pub use store::SqliteStore;
