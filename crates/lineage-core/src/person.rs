//! Person records, the nodes of the lineage graph.
//!
//! A person is created once and never deleted. Attributes change only through
//! a partial-merge [`PersonPatch`]; identity (`person_id`, `created_at`) is
//! fixed at creation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
  Male,
  Female,
  Other,
}

/// Privilege level of a person. Only [`Role::Admin`] grants anything.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
  Admin,
  Member,
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:   Uuid,
  pub firstname:   String,
  pub surname:     String,
  pub dob:         NaiveDate,
  pub gender:      Option<Gender>,
  /// URI handed back by the photo store; never dereferenced here.
  pub profile_pic: Option<String>,
  pub instagram:   Option<String>,
  pub anniversary: Option<NaiveDate>,
  /// Derived from the marriage table: `true` while an active marriage exists.
  pub married:     bool,
  pub role:        Option<Role>,
  pub created_at:  DateTime<Utc>,
}

impl Person {
  pub fn is_admin(&self) -> bool { self.role == Some(Role::Admin) }
}

// ─── NewPerson ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RegistryStore::create_person`] and to the
/// relationship mutators. Ids and timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub firstname:   String,
  pub surname:     String,
  pub dob:         NaiveDate,
  pub gender:      Option<Gender>,
  pub profile_pic: Option<String>,
}

impl NewPerson {
  pub fn new(
    firstname: impl Into<String>,
    surname: impl Into<String>,
    dob: NaiveDate,
  ) -> Self {
    Self {
      firstname: firstname.into(),
      surname: surname.into(),
      dob,
      gender: None,
      profile_pic: None,
    }
  }

  pub fn with_gender(mut self, gender: Gender) -> Self {
    self.gender = Some(gender);
    self
  }

  /// Reject blank names. Everything else is enforced by the type system.
  pub fn validate(&self) -> Result<()> {
    if self.firstname.trim().is_empty() {
      return Err(Error::InvalidField {
        field:  "firstname",
        reason: "must not be empty".into(),
      });
    }
    if self.surname.trim().is_empty() {
      return Err(Error::InvalidField {
        field:  "surname",
        reason: "must not be empty".into(),
      });
    }
    Ok(())
  }
}

// ─── PersonPatch ─────────────────────────────────────────────────────────────

/// A partial update. `None` means "leave unchanged"; there is no way to clear
/// a field back to null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPatch {
  pub firstname:   Option<String>,
  pub surname:     Option<String>,
  pub dob:         Option<NaiveDate>,
  pub gender:      Option<Gender>,
  pub profile_pic: Option<String>,
  pub instagram:   Option<String>,
  pub anniversary: Option<NaiveDate>,
}

impl PersonPatch {
  /// Treat empty or whitespace-only strings as absent.
  pub fn normalized(self) -> Self {
    fn keep(s: Option<String>) -> Option<String> {
      s.filter(|v| !v.trim().is_empty())
    }
    Self {
      firstname:   keep(self.firstname),
      surname:     keep(self.surname),
      dob:         self.dob,
      gender:      self.gender,
      profile_pic: keep(self.profile_pic),
      instagram:   keep(self.instagram),
      anniversary: self.anniversary,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_uses_uppercase_on_the_wire() {
    assert_eq!(Role::Admin.to_string(), "ADMIN");
    assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"MEMBER\"");
  }

  #[test]
  fn gender_parses_case_insensitively() {
    assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
    assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
    assert!("robot".parse::<Gender>().is_err());
  }

  #[test]
  fn blank_strings_are_dropped_from_patch() {
    let patch = PersonPatch {
      firstname: Some("".into()),
      instagram: Some("  ".into()),
      surname: Some("Ward".into()),
      ..Default::default()
    }
    .normalized();

    assert_eq!(patch.firstname, None);
    assert_eq!(patch.instagram, None);
    assert_eq!(patch.surname.as_deref(), Some("Ward"));
    assert_eq!(PersonPatch::default().normalized(), PersonPatch::default());
  }

  #[test]
  fn new_person_rejects_blank_names() {
    let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    assert!(NewPerson::new("Ada", "Ward", dob).validate().is_ok());
    assert!(matches!(
      NewPerson::new(" ", "Ward", dob).validate(),
      Err(Error::InvalidField { field: "firstname", .. })
    ));
  }
}
