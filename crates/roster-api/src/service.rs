//! The record lifecycle: validate, enrich, persist.
//!
//! [`PeopleService`] is transport-agnostic. The HTTP handlers in
//! [`crate::people`] are thin wrappers around it.

use std::sync::Arc;

use roster_core::{
  Error, Result,
  cache::CacheStore,
  filter::{Listing, PersonFilter},
  person::{Person, PersonDraft, PersonPatch},
  store::PersonStore,
};
use roster_enrich::{Enricher, Upstream};
use tracing::info;
use uuid::Uuid;

pub struct PeopleService<S, C, U> {
  store:    Arc<S>,
  enricher: Arc<Enricher<C, U>>,
}

impl<S, C, U> PeopleService<S, C, U>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  pub fn new(store: Arc<S>, enricher: Arc<Enricher<C, U>>) -> Self {
    Self { store, enricher }
  }

  /// Validate `draft`, overwrite its demographics with lookup results and
  /// persist it. Nothing is stored if any lookup fails.
  pub async fn create(&self, draft: PersonDraft) -> Result<Person> {
    let mut attrs = draft.into_attrs()?;
    let enrichment = self.enricher.enrich(&attrs.name).await?;
    attrs.enrich(enrichment);

    let person = self.store.insert(attrs).await.map_err(Error::from_store)?;
    info!(id = %person.id, name = %person.attrs.name, "person created");
    Ok(person)
  }

  pub async fn get(&self, id: Uuid) -> Result<Person> {
    self
      .store
      .get(id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::NotFound(id))
  }

  pub async fn list(&self, filter: &PersonFilter) -> Result<Listing> {
    let query = filter.normalize();
    self.store.select(&query).await.map_err(Error::from_store)
  }

  /// Merge `patch` onto the stored record and replace it. The merged record
  /// is validated again but not re-enriched.
  pub async fn update(&self, id: Uuid, patch: PersonPatch) -> Result<Person> {
    let current = self.get(id).await?;
    let attrs = patch.apply(&current).into_attrs()?;

    let person = self
      .store
      .replace(id, attrs)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::NotFound(id))?;
    info!(%id, "person updated");
    Ok(person)
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let removed = self.store.delete(id).await.map_err(Error::from_store)?;
    if removed == 0 {
      return Err(Error::NotFound(id));
    }
    info!(%id, "person deleted");
    Ok(())
  }
}
