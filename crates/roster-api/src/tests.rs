//! Lifecycle and router tests over an in-memory store and a scripted upstream.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use bytes::Bytes;
use roster_core::{
  Category, Error as CoreError,
  filter::{Listing, PersonFilter, PersonQuery},
  person::{Gender, Person, PersonAttrs, PersonDraft, PersonPatch},
  store::{PersonStore, StoreError},
  validate::Field,
};
use roster_enrich::{Endpoints, Enricher, LookupClient, MemoryCache, Upstream, Url};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiError, PeopleService, api_router};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Replies per host and counts calls.
#[derive(Default)]
struct ScriptedUpstream {
  replies: HashMap<&'static str, (u16, &'static str)>,
  calls:   Mutex<usize>,
}

impl ScriptedUpstream {
  fn alice() -> Self {
    Self::default()
      .reply("age.test", 200, r#"{"count":1200,"name":"Alice","age":34}"#)
      .reply("gender.test", 200, r#"{"name":"Alice","gender":"female","probability":0.98}"#)
      .reply(
        "nationality.test",
        200,
        r#"{"name":"Alice","country":[{"country_id":"US","probability":0.12}]}"#,
      )
  }

  fn reply(mut self, host: &'static str, status: u16, body: &'static str) -> Self {
    self.replies.insert(host, (status, body));
    self
  }

  fn calls(&self) -> usize { *self.calls.lock().unwrap() }
}

impl Upstream for ScriptedUpstream {
  async fn get(&self, url: &Url) -> roster_enrich::Result<Bytes> {
    *self.calls.lock().unwrap() += 1;
    match self.replies.get(url.host_str().unwrap_or_default()) {
      Some(&(200, body)) => Ok(Bytes::from_static(body.as_bytes())),
      Some(&(status, _)) => Err(roster_enrich::Error::Status { url: url.to_string(), status }),
      None => Err(roster_enrich::Error::Status { url: url.to_string(), status: 404 }),
    }
  }
}

type TestService = PeopleService<SqliteStore, MemoryCache, Arc<ScriptedUpstream>>;

struct Harness {
  service:  Arc<TestService>,
  store:    Arc<SqliteStore>,
  upstream: Arc<ScriptedUpstream>,
}

async fn harness(upstream: ScriptedUpstream) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let upstream = Arc::new(upstream);
  let endpoints = Endpoints {
    age:         Url::parse("http://age.test/").unwrap(),
    gender:      Url::parse("http://gender.test/").unwrap(),
    nationality: Url::parse("http://nationality.test/").unwrap(),
  };
  let lookups = LookupClient::new(Arc::new(MemoryCache::new()), upstream.clone());
  let enricher = Arc::new(Enricher::new(lookups, endpoints));
  let service = Arc::new(PeopleService::new(store.clone(), enricher));
  Harness { service, store, upstream }
}

async fn stored_count(store: &SqliteStore) -> u64 {
  store.select(&PersonQuery::default()).await.unwrap().total
}

/// A store whose every call fails as if the database were unreachable.
struct OfflineStore;

#[derive(Debug, thiserror::Error)]
#[error("database unreachable")]
struct Unreachable;

impl StoreError for Unreachable {
  fn is_conflict(&self) -> bool { false }
}

impl PersonStore for OfflineStore {
  type Error = Unreachable;

  async fn insert(&self, _attrs: PersonAttrs) -> Result<Person, Unreachable> { Err(Unreachable) }

  async fn insert_with_id(&self, _id: Uuid, _attrs: PersonAttrs) -> Result<Person, Unreachable> {
    Err(Unreachable)
  }

  async fn get(&self, _id: Uuid) -> Result<Option<Person>, Unreachable> { Err(Unreachable) }

  async fn replace(&self, _id: Uuid, _attrs: PersonAttrs) -> Result<Option<Person>, Unreachable> {
    Err(Unreachable)
  }

  async fn delete(&self, _id: Uuid) -> Result<u64, Unreachable> { Err(Unreachable) }

  async fn select(&self, _query: &PersonQuery) -> Result<Listing, Unreachable> { Err(Unreachable) }
}

fn offline_service() -> PeopleService<OfflineStore, MemoryCache, Arc<ScriptedUpstream>> {
  let endpoints = Endpoints {
    age:         Url::parse("http://age.test/").unwrap(),
    gender:      Url::parse("http://gender.test/").unwrap(),
    nationality: Url::parse("http://nationality.test/").unwrap(),
  };
  let lookups = LookupClient::new(
    Arc::new(MemoryCache::new()),
    Arc::new(ScriptedUpstream::alice()),
  );
  PeopleService::new(Arc::new(OfflineStore), Arc::new(Enricher::new(lookups, endpoints)))
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alice_is_enriched_then_persisted() {
  let h = harness(ScriptedUpstream::alice()).await;

  let person = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();
  assert_eq!(person.attrs.age, 34);
  assert_eq!(person.attrs.gender, Some(Gender::Female));
  assert_eq!(person.attrs.nationality.as_deref(), Some("US"));
  assert_eq!(h.upstream.calls(), 3);

  let stored = h.service.get(person.id).await.unwrap();
  assert_eq!(stored, person);
}

#[tokio::test]
async fn enrichment_overrides_submitted_demographics() {
  let h = harness(ScriptedUpstream::alice()).await;
  let draft = PersonDraft {
    age: 90,
    gender: Some("other".into()),
    nationality: Some("FR".into()),
    ..PersonDraft::new("Alice", "Smith")
  };

  let person = h.service.create(draft).await.unwrap();
  assert_eq!(person.attrs.age, 34);
  assert_eq!(person.attrs.gender, Some(Gender::Female));
  assert_eq!(person.attrs.nationality.as_deref(), Some("US"));
}

#[tokio::test]
async fn failed_gender_lookup_persists_nothing() {
  let h = harness(ScriptedUpstream::alice().reply("gender.test", 500, "")).await;

  let err = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap_err();
  match err {
    CoreError::Lookup { category, .. } => assert_eq!(category, Category::Gender),
    other => panic!("unexpected error: {other:?}"),
  }
  assert_eq!(stored_count(&h.store).await, 0);
}

#[tokio::test]
async fn invalid_draft_never_reaches_upstream() {
  let h = harness(ScriptedUpstream::alice()).await;

  let err = h.service.create(PersonDraft::new("  ", "Sm1th")).await.unwrap_err();
  match err {
    CoreError::Validation(v) => {
      assert!(v.touches(Field::Name));
      assert!(v.touches(Field::Surname));
    }
    other => panic!("unexpected error: {other:?}"),
  }
  assert_eq!(h.upstream.calls(), 0);
}

#[tokio::test]
async fn update_merges_without_reenriching() {
  let h = harness(ScriptedUpstream::alice()).await;
  let person = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();

  let patch = PersonPatch { surname: Some("Jones".into()), ..Default::default() };
  let updated = h.service.update(person.id, patch).await.unwrap();

  assert_eq!(updated.id, person.id);
  assert_eq!(updated.attrs.surname, "Jones");
  assert_eq!(updated.attrs.age, 34);
  assert_eq!(updated.attrs.nationality.as_deref(), Some("US"));
  assert_eq!(h.upstream.calls(), 3);
}

#[tokio::test]
async fn update_revalidates_merged_record() {
  let h = harness(ScriptedUpstream::alice()).await;
  let person = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();

  let patch = PersonPatch { age: Some(130), ..Default::default() };
  let err = h.service.update(person.id, patch).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(ref v) if v.touches(Field::Age)), "{err:?}");

  assert_eq!(h.service.get(person.id).await.unwrap(), person);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
  let h = harness(ScriptedUpstream::alice()).await;
  let id = Uuid::new_v4();
  let err = h.service.update(id, PersonPatch::default()).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(got) if got == id));
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() {
  let h = harness(ScriptedUpstream::alice()).await;
  let person = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();

  h.service.delete(person.id).await.unwrap();
  let err = h.service.delete(person.id).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(id) if id == person.id));
  assert!(matches!(h.service.get(person.id).await, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn store_failure_is_distinct_from_not_found() {
  let service = offline_service();
  let id = Uuid::new_v4();

  let err = service.delete(id).await.unwrap_err();
  assert!(matches!(err, CoreError::Store(_)), "{err:?}");
  assert_eq!(err.kind(), "internal");
  assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);

  assert!(matches!(service.get(id).await, Err(CoreError::Store(_))));
  let err = service.create(PersonDraft::new("Alice", "Smith")).await.unwrap_err();
  assert!(matches!(err, CoreError::Store(_)), "{err:?}");
}

#[tokio::test]
async fn list_applies_filter() {
  let h = harness(ScriptedUpstream::alice()).await;
  h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();
  h.service.create(PersonDraft::new("Alice", "Jones")).await.unwrap();

  let filter = PersonFilter { surname: Some("JON".into()), ..Default::default() };
  let listing = h.service.list(&filter).await.unwrap();
  assert_eq!(listing.total, 1);
  assert_eq!(listing.data[0].attrs.surname, "Jones");

  // The second create is served from the lookup cache.
  assert_eq!(h.upstream.calls(), 3);
}

#[test]
fn error_statuses() {
  let status = |e: CoreError| ApiError::from(e).status();
  assert_eq!(status(CoreError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
  assert_eq!(status(CoreError::Conflict("taken".into())), StatusCode::CONFLICT);
  assert_eq!(status(CoreError::Store("disk full".into())), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(
    status(CoreError::Lookup { category: Category::Age, source: "timeout".into() }),
    StatusCode::FAILED_DEPENDENCY
  );
  assert_eq!(
    ApiError::BadRequest("nope".into()).status(),
    StatusCode::BAD_REQUEST
  );
}

// ─── Router ──────────────────────────────────────────────────────────────────

async fn send(h: &Harness, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  api_router(h.service.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn post_then_get_roundtrip() {
  let h = harness(ScriptedUpstream::alice()).await;

  let resp = send(&h, "POST", "/people", Some(json!({"name": "Alice", "surname": "Smith"}))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert_eq!(created["age"], 34);
  assert_eq!(created["gender"], "female");
  assert_eq!(created["nationality"], "US");

  let id = created["id"].as_str().unwrap();
  let resp = send(&h, "GET", &format!("/people/{id}"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, created);
}

#[tokio::test]
async fn list_returns_envelope() {
  let h = harness(ScriptedUpstream::alice()).await;
  for surname in ["Smith", "Jones", "Brown"] {
    h.service.create(PersonDraft::new("Alice", surname)).await.unwrap();
  }

  let resp = send(&h, "GET", "/people?limit=2&page=0", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["total"], 3);
  assert_eq!(body["page"], 1);
  assert_eq!(body["limit"], 2);
  assert_eq!(body["data"].as_array().unwrap().len(), 2);
  assert!(body["as_of"].is_string());

  let resp = send(&h, "GET", "/people?surname=brown", None).await;
  let body = json_body(resp).await;
  assert_eq!(body["total"], 1);
  assert_eq!(body["data"][0]["surname"], "Brown");
}

#[tokio::test]
async fn invalid_create_lists_every_violation() {
  let h = harness(ScriptedUpstream::alice()).await;

  let resp = send(&h, "POST", "/people", Some(json!({"name": "A1", "surname": "", "age": 200}))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["type"], "validation");

  let fields: Vec<&str> = body["details"]
    .as_array()
    .unwrap()
    .iter()
    .map(|d| d["field"].as_str().unwrap())
    .collect();
  assert!(fields.contains(&"name"));
  assert!(fields.contains(&"surname"));
  assert!(fields.contains(&"age"));
}

#[tokio::test]
async fn lookup_failure_is_failed_dependency() {
  let h = harness(ScriptedUpstream::alice().reply("nationality.test", 503, "")).await;

  let resp = send(&h, "POST", "/people", Some(json!({"name": "Alice", "surname": "Smith"}))).await;
  assert_eq!(resp.status(), StatusCode::FAILED_DEPENDENCY);
  let body = json_body(resp).await;
  assert_eq!(body["type"], "external_service");
  assert!(body.get("details").is_none());
  assert_eq!(stored_count(&h.store).await, 0);
}

#[tokio::test]
async fn put_updates_and_delete_removes() {
  let h = harness(ScriptedUpstream::alice()).await;
  let person = h.service.create(PersonDraft::new("Alice", "Smith")).await.unwrap();
  let uri = format!("/people/{}", person.id);

  let resp = send(&h, "PUT", &uri, Some(json!({"patronymic": "Marie", "gender": "OTHER"}))).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["patronymic"], "Marie");
  assert_eq!(body["gender"], "other");
  assert_eq!(body["surname"], "Smith");

  let resp = send(&h, "DELETE", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(&h, "DELETE", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["type"], "not_found");
}

#[tokio::test]
async fn unknown_id_is_404() {
  let h = harness(ScriptedUpstream::alice()).await;
  let uri = format!("/people/{}", Uuid::new_v4());

  let resp = send(&h, "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&h, "PUT", &uri, Some(json!({"surname": "Jones"}))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_400() {
  let h = harness(ScriptedUpstream::alice()).await;

  let resp = send(&h, "GET", "/people/not-a-uuid", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["type"], "bad_request");

  let resp = send(&h, "POST", "/people", Some(json!(["not", "an", "object"]))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(&h, "GET", "/people?age=old", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(h.upstream.calls(), 0);
}
