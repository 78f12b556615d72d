//! [`SqliteStore`], the SQLite implementation of [`PersonStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{
  OptionalExtension as _,
  functions::FunctionFlags,
  types::Value,
};
use uuid::Uuid;

use roster_core::{
  filter::{Criteria, Listing, PersonQuery, fold_case},
  person::{Person, PersonAttrs},
  store::PersonStore,
};

use crate::{
  Result,
  encode::{PERSON_COLUMNS, RawPerson, encode_dt, encode_gender, encode_uuid},
  schema::{CASEFOLD_FN, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          CASEFOLD_FN,
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| {
            let s: Option<String> = ctx.get(0)?;
            Ok(s.map(|s| fold_case(&s)))
          },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-built [`Person`] into the `people` table.
  async fn insert_person(&self, person: Person) -> Result<Person> {
    let id_str      = encode_uuid(person.id);
    let created_str = encode_dt(person.created_at);
    let updated_str = encode_dt(person.updated_at);
    let a           = person.attrs.clone();
    let gender      = a.gender.map(encode_gender);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (
             person_id, name, surname, patronymic, age, gender, nationality,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            a.name,
            a.surname,
            a.patronymic,
            a.age,
            gender,
            a.nationality,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(id = %person.id, "person inserted");
    Ok(person)
  }
}

// ─── Query construction ──────────────────────────────────────────────────────

/// Build the `WHERE` clause and its positional parameters for `criteria`,
/// bounded above by the snapshot instant `as_of`.
fn where_clause(criteria: &Criteria, as_of: &str) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = vec!["created_at <= ?".to_owned()];
  let mut params: Vec<Value> = vec![Value::Text(as_of.to_owned())];

  if let Some(name) = &criteria.name_contains {
    conds.push(format!("instr({CASEFOLD_FN}(name), ?) > 0"));
    params.push(Value::Text(name.clone()));
  }
  if let Some(surname) = &criteria.surname_contains {
    conds.push(format!("instr({CASEFOLD_FN}(surname), ?) > 0"));
    params.push(Value::Text(surname.clone()));
  }
  if let Some(age) = criteria.age {
    conds.push("age = ?".to_owned());
    params.push(Value::Integer(i64::from(age)));
  }
  if let Some(gender) = &criteria.gender {
    conds.push("gender = ?".to_owned());
    params.push(Value::Text(gender.clone()));
  }
  if let Some(nationality) = &criteria.nationality {
    conds.push("nationality = ?".to_owned());
    params.push(Value::Text(nationality.clone()));
  }

  (conds.join(" AND "), params)
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, attrs: PersonAttrs) -> Result<Person> {
    self.insert_with_id(Uuid::new_v4(), attrs).await
  }

  async fn insert_with_id(&self, id: Uuid, attrs: PersonAttrs) -> Result<Person> {
    let now = Utc::now();
    self
      .insert_person(Person { id, attrs, created_at: now, updated_at: now })
      .await
  }

  async fn get(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn replace(&self, id: Uuid, attrs: PersonAttrs) -> Result<Option<Person>> {
    let id_str      = encode_uuid(id);
    let updated_str = encode_dt(Utc::now());
    let gender      = attrs.gender.map(encode_gender);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE people
              SET name = ?2, surname = ?3, patronymic = ?4, age = ?5,
                  gender = ?6, nationality = ?7, updated_at = ?8
            WHERE person_id = ?1",
          rusqlite::params![
            id_str,
            attrs.name,
            attrs.surname,
            attrs.patronymic,
            attrs.age,
            gender,
            attrs.nationality,
            updated_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn delete(&self, id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM people WHERE person_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(removed as u64)
  }

  async fn select(&self, query: &PersonQuery) -> Result<Listing> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let (where_sql, params) = where_clause(&query.criteria, &encode_dt(as_of));
    let limit  = i64::from(query.limit);
    let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawPerson>) = self
      .conn
      .call(move |conn| {
        // One read transaction so the count and the page see the same rows.
        let tx = conn.transaction()?;

        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM people WHERE {where_sql}"),
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {PERSON_COLUMNS}
               FROM people
              WHERE {where_sql}
              ORDER BY created_at DESC, person_id DESC
              LIMIT ? OFFSET ?"
          ))?;
          let page_params = params
            .iter()
            .cloned()
            .chain([Value::Integer(limit), Value::Integer(offset)]);
          stmt
            .query_map(rusqlite::params_from_iter(page_params), RawPerson::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawPerson::into_person)
      .collect::<Result<Vec<_>>>()?;

    Ok(Listing {
      data,
      total: u64::try_from(total).unwrap_or_default(),
      page: query.page,
      limit: query.limit,
      as_of,
    })
  }
}
