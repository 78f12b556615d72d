//! Compose the age, gender and nationality lookups for a name.
//!
//! The three lookups run concurrently. The first failure aborts the rest and
//! no partial [`Enrichment`] is ever returned.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;
use roster_core::{
  Category,
  cache::CacheStore,
  person::{Enrichment, Gender, UNKNOWN_NATIONALITY},
  validate::AGE_MAX,
};
use serde::Deserialize;
use thiserror::Error;

use crate::{Error, Result, lookup::LookupClient, upstream::Upstream};

/// Cached lookup responses live this long unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A lookup failure tagged with the category it belongs to.
#[derive(Debug, Error)]
#[error("{category} lookup failed: {source}")]
pub struct EnrichError {
  pub category: Category,
  #[source]
  pub source:   Error,
}

impl From<EnrichError> for roster_core::Error {
  fn from(e: EnrichError) -> Self {
    roster_core::Error::Lookup { category: e.category, source: Box::new(e.source) }
  }
}

trait Tag<T> {
  fn tag(self, category: Category) -> Result<T, EnrichError>;
}

impl<T> Tag<T> for Result<T> {
  fn tag(self, category: Category) -> Result<T, EnrichError> {
    self.map_err(|source| EnrichError { category, source })
  }
}

// ─── Endpoints ───────────────────────────────────────────────────────────────

/// Base URLs of the three lookup services. The subject name is appended as
/// the `name` query parameter.
#[derive(Debug, Clone)]
pub struct Endpoints {
  pub age:         Url,
  pub gender:      Url,
  pub nationality: Url,
}

impl Endpoints {
  fn url_for(&self, category: Category, name: &str) -> Url {
    let mut url = match category {
      Category::Age => self.age.clone(),
      Category::Gender => self.gender.clone(),
      Category::Nationality => self.nationality.clone(),
    };
    url.query_pairs_mut().append_pair("name", name);
    url
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AgePayload {
  age: Option<i64>,
}

#[derive(Deserialize)]
struct GenderPayload {
  gender: Option<String>,
}

#[derive(Deserialize)]
struct NationalityPayload {
  #[serde(default)]
  country: Vec<CountryCandidate>,
}

#[derive(Deserialize)]
struct CountryCandidate {
  country_id: String,
}

fn decode_age(body: &[u8]) -> Result<u8> {
  let payload: AgePayload = serde_json::from_slice(body)?;
  let age = payload
    .age
    .ok_or_else(|| Error::Decode("no age estimate for this name".into()))?;
  u8::try_from(age)
    .ok()
    .filter(|a| i32::from(*a) <= AGE_MAX)
    .ok_or_else(|| Error::Decode(format!("age {age} is out of range")))
}

/// A `null` gender means the service has no estimate; the attribute stays
/// unset.
fn decode_gender(body: &[u8]) -> Result<Option<Gender>> {
  let payload: GenderPayload = serde_json::from_slice(body)?;
  payload
    .gender
    .map(|g| {
      g.parse::<Gender>()
        .map_err(|_| Error::Decode(format!("unrecognised gender {g:?}")))
    })
    .transpose()
}

/// Candidates arrive ranked; the first one wins.
fn decode_nationality(body: &[u8]) -> Result<String> {
  let payload: NationalityPayload = serde_json::from_slice(body)?;
  match payload.country.into_iter().next() {
    None => Ok(UNKNOWN_NATIONALITY.to_owned()),
    Some(c) if c.country_id.len() == 2 && c.country_id.chars().all(|ch| ch.is_ascii_alphabetic()) => {
      Ok(c.country_id.to_ascii_uppercase())
    }
    Some(c) => Err(Error::Decode(format!("bad country code {:?}", c.country_id))),
  }
}

// ─── Enricher ────────────────────────────────────────────────────────────────

pub struct Enricher<C, U> {
  lookups:   LookupClient<C, U>,
  endpoints: Endpoints,
  ttl:       Duration,
}

impl<C, U> Enricher<C, U>
where
  C: CacheStore,
  U: Upstream,
{
  pub fn new(lookups: LookupClient<C, U>, endpoints: Endpoints) -> Self {
    Self { lookups, endpoints, ttl: DEFAULT_TTL }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Look up age, gender and nationality for `name`.
  ///
  /// `name` must already have passed validation.
  pub async fn enrich(&self, name: &str) -> Result<Enrichment, EnrichError> {
    let (age, gender, nationality) = tokio::try_join!(
      self.age(name),
      self.gender(name),
      self.nationality(name),
    )?;

    tracing::debug!(name, age, ?gender, %nationality, "enriched");
    Ok(Enrichment { age, gender, nationality })
  }

  async fn raw(&self, category: Category, name: &str) -> Result<Bytes> {
    let key = format!("{category}:{name}");
    let url = self.endpoints.url_for(category, name);
    self.lookups.fetch(&key, &url, self.ttl).await
  }

  async fn age(&self, name: &str) -> Result<u8, EnrichError> {
    let body = self.raw(Category::Age, name).await.tag(Category::Age)?;
    decode_age(&body).tag(Category::Age)
  }

  async fn gender(&self, name: &str) -> Result<Option<Gender>, EnrichError> {
    let body = self.raw(Category::Gender, name).await.tag(Category::Gender)?;
    decode_gender(&body).tag(Category::Gender)
  }

  async fn nationality(&self, name: &str) -> Result<String, EnrichError> {
    let body = self
      .raw(Category::Nationality, name)
      .await
      .tag(Category::Nationality)?;
    decode_nationality(&body).tag(Category::Nationality)
  }
}
