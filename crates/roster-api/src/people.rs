//! Handlers for `/people` endpoints.
//!
//! | Method   | Path           | Notes |
//! |----------|----------------|-------|
//! | `GET`    | `/people`      | `?name=&surname=&age=&gender=&nationality=&page=&limit=&as_of=` |
//! | `POST`   | `/people`      | Body: `{"name":"Alice","surname":"Smith"}`; 201 |
//! | `GET`    | `/people/{id}` | 404 if not found |
//! | `PUT`    | `/people/{id}` | Partial body; 404 if not found |
//! | `DELETE` | `/people/{id}` | 204; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  cache::CacheStore,
  filter::{Listing, PersonFilter},
  person::{Person, PersonDraft, PersonPatch},
  store::PersonStore,
};
use roster_enrich::Upstream;
use uuid::Uuid;

use crate::{error::ApiError, service::PeopleService};

type Service<S, C, U> = State<Arc<PeopleService<S, C, U>>>;

fn bad_request(rejection: impl std::fmt::Display) -> ApiError {
  ApiError::BadRequest(rejection.to_string())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /people[?name=..&page=..]`
pub async fn list<S, C, U>(
  State(service): Service<S, C, U>,
  query: Result<Query<PersonFilter>, QueryRejection>,
) -> Result<Json<Listing>, ApiError>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  let Query(filter) = query.map_err(bad_request)?;
  Ok(Json(service.list(&filter).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /people`
pub async fn create<S, C, U>(
  State(service): Service<S, C, U>,
  body: Result<Json<PersonDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  let Json(draft) = body.map_err(bad_request)?;
  let person = service.create(draft).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /people/{id}`
pub async fn get_one<S, C, U>(
  State(service): Service<S, C, U>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Person>, ApiError>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  let Path(id) = id.map_err(bad_request)?;
  Ok(Json(service.get(id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /people/{id}`
pub async fn update_one<S, C, U>(
  State(service): Service<S, C, U>,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<PersonPatch>, JsonRejection>,
) -> Result<Json<Person>, ApiError>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  let Path(id) = id.map_err(bad_request)?;
  let Json(patch) = body.map_err(bad_request)?;
  Ok(Json(service.update(id, patch).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /people/{id}`
pub async fn delete_one<S, C, U>(
  State(service): Service<S, C, U>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: PersonStore,
  C: CacheStore,
  U: Upstream,
{
  let Path(id) = id.map_err(bad_request)?;
  service.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
