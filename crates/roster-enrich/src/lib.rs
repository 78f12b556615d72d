//! Demographic enrichment for Roster person records.
//!
//! [`lookup`] implements the cache-aside read path over any
//! [`roster_core::cache::CacheStore`] and [`upstream::Upstream`];
//! [`enricher`] composes three such lookups (age, gender, nationality) into a
//! single [`roster_core::person::Enrichment`].

pub mod enricher;
pub mod error;
pub mod lookup;
pub mod memory;
pub mod upstream;

pub use enricher::{EnrichError, Endpoints, Enricher};
pub use error::{Error, Result};
pub use lookup::{LookupClient, cache_aside};
pub use memory::MemoryCache;
pub use reqwest::Url;
pub use upstream::{HttpUpstream, Upstream};
