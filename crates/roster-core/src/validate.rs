//! Validation rules for person input.
//!
//! Every rule is evaluated; nothing short-circuits. The checks also produce
//! the normalised [`PersonAttrs`], so a value of that type is proof that its
//! draft passed validation.

use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::person::{Gender, PersonAttrs, PersonDraft, UNKNOWN_NATIONALITY};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const AGE_MAX: i32 = 120;

// ─── Violations ──────────────────────────────────────────────────────────────

/// The input field a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Field {
  Name,
  Surname,
  Patronymic,
  Age,
  Gender,
  Nationality,
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
  pub field:   Field,
  pub message: String,
}

impl Violation {
  fn new(field: Field, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

/// A non-empty, ordered set of violations carried by
/// [`Error::Validation`](crate::Error::Validation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
  /// Whether any violation refers to `field`.
  pub fn touches(&self, field: Field) -> bool {
    self.0.iter().any(|v| v.field == field)
  }
}

impl From<Vec<Violation>> for Violations {
  fn from(v: Vec<Violation>) -> Self { Self(v) }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, v) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{v}")?;
    }
    Ok(())
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Check `draft` against every rule. An empty result means the draft is valid.
pub fn validate(draft: &PersonDraft) -> Vec<Violation> {
  match check(draft) {
    Ok(_) => Vec::new(),
    Err(v) => v,
  }
}

/// Run every rule and, if none failed, return the normalised attributes.
pub(crate) fn check(draft: &PersonDraft) -> Result<PersonAttrs, Vec<Violation>> {
  let mut violations = Vec::new();

  let name = required_name(Field::Name, &draft.name, &mut violations);
  let surname = required_name(Field::Surname, &draft.surname, &mut violations);
  let patronymic = optional_name(draft.patronymic.as_deref(), &mut violations);
  let age = age(draft.age, &mut violations);
  let gender = gender(draft.gender.as_deref(), &mut violations);
  let nationality = nationality(draft.nationality.as_deref(), &mut violations);

  match (name, surname, patronymic, age, gender, nationality) {
    (Some(name), Some(surname), Some(patronymic), Some(age), Some(gender), Some(nationality))
      if violations.is_empty() =>
    {
      Ok(PersonAttrs { name, surname, patronymic, age, gender, nationality })
    }
    _ => Err(violations),
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Latin (with the Latin-1 and Extended-A accented letters) or Cyrillic.
fn is_name_letter(c: char) -> bool {
  c.is_ascii_alphabetic()
    || (c.is_alphabetic() && matches!(c, '\u{00C0}'..='\u{024F}' | '\u{0400}'..='\u{04FF}'))
}

/// Character-class and length rules shared by all three name fields.
fn name_shape(field: Field, value: &str, out: &mut Vec<Violation>) -> bool {
  let mut ok = true;
  if !value.chars().all(|c| c == '-' || is_name_letter(c)) {
    out.push(Violation::new(
      field,
      format!("{field} may only contain letters and hyphens"),
    ));
    ok = false;
  }
  let len = value.chars().count();
  if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
    out.push(Violation::new(
      field,
      format!("{field} must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
    ));
    ok = false;
  }
  ok
}

fn required_name(field: Field, raw: &str, out: &mut Vec<Violation>) -> Option<String> {
  let value = raw.trim();
  if value.is_empty() {
    out.push(Violation::new(field, format!("{field} is required")));
    return None;
  }
  name_shape(field, value, out).then(|| value.to_owned())
}

/// `Some(None)` when absent or blank, `None` on violation.
fn optional_name(raw: Option<&str>, out: &mut Vec<Violation>) -> Option<Option<String>> {
  match raw.map(str::trim).filter(|v| !v.is_empty()) {
    None => Some(None),
    Some(value) => name_shape(Field::Patronymic, value, out).then(|| Some(value.to_owned())),
  }
}

fn age(raw: i32, out: &mut Vec<Violation>) -> Option<u8> {
  match u8::try_from(raw) {
    Ok(age) if raw <= AGE_MAX => Some(age),
    _ => {
      out.push(Violation::new(
        Field::Age,
        format!("age must be between 0 and {AGE_MAX}"),
      ));
      None
    }
  }
}

fn gender(raw: Option<&str>, out: &mut Vec<Violation>) -> Option<Option<Gender>> {
  match raw.map(str::trim).filter(|v| !v.is_empty()) {
    None => Some(None),
    Some(value) => match value.parse::<Gender>() {
      Ok(g) => Some(Some(g)),
      Err(_) => {
        out.push(Violation::new(
          Field::Gender,
          "gender must be one of male, female, other",
        ));
        None
      }
    },
  }
}

fn nationality(raw: Option<&str>, out: &mut Vec<Violation>) -> Option<Option<String>> {
  match raw.map(str::trim).filter(|v| !v.is_empty()) {
    None => Some(None),
    Some(value) if value.eq_ignore_ascii_case(UNKNOWN_NATIONALITY) => {
      Some(Some(UNKNOWN_NATIONALITY.to_owned()))
    }
    Some(value) if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) => {
      Some(Some(value.to_ascii_uppercase()))
    }
    Some(_) => {
      out.push(Violation::new(
        Field::Nationality,
        "nationality must be a two-letter country code",
      ));
      None
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
