//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that string comparison matches chronological
//! order. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use roster_core::person::{Gender, Person, PersonAttrs};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` that builds a [`RawPerson`].
pub const PERSON_COLUMNS: &str =
  "person_id, name, surname, patronymic, age, gender, nationality, created_at, updated_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Gender ───────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str {
  match g {
    Gender::Male => "male",
    Gender::Female => "female",
    Gender::Other => "other",
  }
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "male" => Ok(Gender::Male),
    "female" => Ok(Gender::Female),
    "other" => Ok(Gender::Other),
    other => Err(Error::Gender(other.to_owned())),
  }
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// Raw column values read from a `people` row, before domain decoding.
pub struct RawPerson {
  pub person_id:   String,
  pub name:        String,
  pub surname:     String,
  pub patronymic:  Option<String>,
  pub age:         u8,
  pub gender:      Option<String>,
  pub nationality: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawPerson {
  /// Read a row selected with [`PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:   row.get(0)?,
      name:        row.get(1)?,
      surname:     row.get(2)?,
      patronymic:  row.get(3)?,
      age:         row.get(4)?,
      gender:      row.get(5)?,
      nationality: row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:         decode_uuid(&self.person_id)?,
      attrs:      PersonAttrs {
        name:        self.name,
        surname:     self.surname,
        patronymic:  self.patronymic,
        age:         self.age,
        gender:      self.gender.as_deref().map(decode_gender).transpose()?,
        nationality: self.nationality,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
