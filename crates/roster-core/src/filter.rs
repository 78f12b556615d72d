//! Filter criteria and pagination for person listings.
//!
//! [`PersonFilter`] is what a caller asks for; [`PersonQuery`] is the
//! normalised, bounded form a store executes. Empty strings and a zero age
//! impose no constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::person::{Person, UNKNOWN_NATIONALITY};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Case folding used for substring matches on names. Stores must apply the
/// same folding to the column side of the comparison.
pub fn fold_case(s: &str) -> String { s.to_lowercase() }

// ─── Request side ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonFilter {
  /// Case-insensitive substring of the given name.
  pub name:        Option<String>,
  /// Case-insensitive substring of the family name.
  pub surname:     Option<String>,
  pub age:         Option<i32>,
  pub gender:      Option<String>,
  pub nationality: Option<String>,
  pub page:        Option<i64>,
  pub limit:       Option<i64>,
  /// Exclude records created after this instant. Pass back the `as_of` of a
  /// previous [`Listing`] to page through a stable snapshot.
  pub as_of:       Option<DateTime<Utc>>,
}

impl PersonFilter {
  pub fn normalize(&self) -> PersonQuery {
    let text = |v: &Option<String>| {
      v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
    };

    let page = match self.page {
      Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
      _ => DEFAULT_PAGE,
    };
    let limit = match self.limit {
      Some(l) if l >= 1 => u32::try_from(l.min(i64::from(MAX_LIMIT))).unwrap_or(MAX_LIMIT),
      _ => DEFAULT_LIMIT,
    };

    PersonQuery {
      criteria: Criteria {
        name_contains:    text(&self.name).map(|s| fold_case(&s)),
        surname_contains: text(&self.surname).map(|s| fold_case(&s)),
        age:              self.age.filter(|a| *a > 0),
        gender:           text(&self.gender).map(|s| s.to_lowercase()),
        nationality:      text(&self.nationality).map(|s| normalize_nationality(&s)),
      },
      page,
      limit,
      as_of: self.as_of,
    }
  }
}

/// Country codes compare upper-case; the enrichment sentinel is stored
/// lower-case, so any casing of it maps back to [`UNKNOWN_NATIONALITY`].
fn normalize_nationality(s: &str) -> String {
  if s.eq_ignore_ascii_case(UNKNOWN_NATIONALITY) {
    UNKNOWN_NATIONALITY.to_owned()
  } else {
    s.to_uppercase()
  }
}

// ─── Store side ──────────────────────────────────────────────────────────────

/// AND-combined predicate; `None` fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
  /// Already case-folded with [`fold_case`].
  pub name_contains:    Option<String>,
  /// Already case-folded with [`fold_case`].
  pub surname_contains: Option<String>,
  pub age:              Option<i32>,
  /// Lower-case.
  pub gender:           Option<String>,
  /// Upper-case.
  pub nationality:      Option<String>,
}

impl Criteria {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Evaluate the predicate in memory.
  pub fn matches(&self, person: &Person) -> bool {
    let a = &person.attrs;
    self
      .name_contains
      .as_ref()
      .is_none_or(|n| fold_case(&a.name).contains(n.as_str()))
      && self
        .surname_contains
        .as_ref()
        .is_none_or(|s| fold_case(&a.surname).contains(s.as_str()))
      && self.age.is_none_or(|age| i32::from(a.age) == age)
      && self
        .gender
        .as_ref()
        .is_none_or(|g| a.gender.is_some_and(|pg| pg.as_ref() == g.as_str()))
      && self
        .nationality
        .as_ref()
        .is_none_or(|n| a.nationality.as_ref() == Some(n))
  }
}

/// A bounded, normalised listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonQuery {
  pub criteria: Criteria,
  /// 1-based.
  pub page:     u32,
  pub limit:    u32,
  pub as_of:    Option<DateTime<Utc>>,
}

impl PersonQuery {
  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PersonQuery {
  fn default() -> Self { PersonFilter::default().normalize() }
}

/// One page of results, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
  pub data:  Vec<Person>,
  /// Matches across all pages.
  pub total: u64,
  pub page:  u32,
  pub limit: u32,
  /// The snapshot instant the page was taken at.
  pub as_of: DateTime<Utc>,
}

impl Listing {
  pub fn total_pages(&self) -> u64 { self.total.div_ceil(u64::from(self.limit.max(1))) }
}
