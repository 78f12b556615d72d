//! Person records: raw drafts, validated attributes, and stored rows.
//!
//! Input arrives as a [`PersonDraft`] (or a [`PersonPatch`] merged onto an
//! existing record) and only becomes [`PersonAttrs`] by passing validation.
//! The store assigns identity and timestamps to produce a [`Person`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, validate};

/// Nationality recorded when the lookup returns no country candidates.
pub const UNKNOWN_NATIONALITY: &str = "unknown";

// ─── Gender ──────────────────────────────────────────────────────────────────

/// Parsed case-insensitively; always stored and rendered lowercase.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
  Male,
  Female,
  Other,
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// The validated, normalised mutable attributes of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonAttrs {
  pub name:        String,
  pub surname:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub patronymic:  Option<String>,
  pub age:         u8,
  pub gender:      Option<Gender>,
  /// Upper-case ISO 3166-1 alpha-2 code, or [`UNKNOWN_NATIONALITY`].
  pub nationality: Option<String>,
}

/// Attributes derived from the external lookups for a given name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrichment {
  pub age:         u8,
  pub gender:      Option<Gender>,
  pub nationality: String,
}

impl PersonAttrs {
  /// Overwrite age, gender and nationality with lookup results.
  pub fn enrich(&mut self, enrichment: Enrichment) {
    self.age = enrichment.age;
    self.gender = enrichment.gender;
    self.nationality = Some(enrichment.nationality);
  }
}

// ─── Stored person ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
  pub id:         Uuid,
  #[serde(flatten)]
  pub attrs:      PersonAttrs,
  /// Store-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Person {
  /// The current attributes as an editable draft.
  pub fn to_draft(&self) -> PersonDraft {
    PersonDraft {
      name:        self.attrs.name.clone(),
      surname:     self.attrs.surname.clone(),
      patronymic:  self.attrs.patronymic.clone(),
      age:         i32::from(self.attrs.age),
      gender:      self.attrs.gender.map(|g| g.to_string()),
      nationality: self.attrs.nationality.clone(),
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Unvalidated person input, as decoded from a creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonDraft {
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub surname:     String,
  pub patronymic:  Option<String>,
  #[serde(default)]
  pub age:         i32,
  pub gender:      Option<String>,
  pub nationality: Option<String>,
}

impl PersonDraft {
  /// A draft with only the required names set.
  pub fn new(name: impl Into<String>, surname: impl Into<String>) -> Self {
    Self { name: name.into(), surname: surname.into(), ..Self::default() }
  }

  /// Validate and normalise. Fails with every violation found.
  pub fn into_attrs(self) -> Result<PersonAttrs> {
    validate::check(&self).map_err(|v| Error::Validation(v.into()))
  }
}

/// A partial update. Absent fields keep their current value; a blank
/// `patronymic`, `gender` or `nationality` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonPatch {
  pub name:        Option<String>,
  pub surname:     Option<String>,
  pub patronymic:  Option<String>,
  pub age:         Option<i32>,
  pub gender:      Option<String>,
  pub nationality: Option<String>,
}

impl PersonPatch {
  /// Merge onto `current`, producing a draft that still has to be validated.
  pub fn apply(self, current: &Person) -> PersonDraft {
    let mut draft = current.to_draft();
    if let Some(name) = self.name {
      draft.name = name;
    }
    if let Some(surname) = self.surname {
      draft.surname = surname;
    }
    if let Some(age) = self.age {
      draft.age = age;
    }
    if self.patronymic.is_some() {
      draft.patronymic = self.patronymic;
    }
    if self.gender.is_some() {
      draft.gender = self.gender;
    }
    if self.nationality.is_some() {
      draft.nationality = self.nationality;
    }
    draft
  }
}
