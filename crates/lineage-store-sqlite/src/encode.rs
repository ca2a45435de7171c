//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Enums use their `strum` names. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use lineage_core::{
  person::{Gender, Person, Role},
  relation::{Marriage, ParentChild},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Gender / Role ───────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> String { g.to_string() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse().map_err(|_| Error::Decode {
    column: "gender",
    value:  s.to_owned(),
  })
}

pub fn encode_role(r: Role) -> String { r.to_string() }

/// Anything other than `ADMIN` is an ordinary member.
pub fn decode_role(s: &str) -> Role { s.parse().unwrap_or(Role::Member) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row plus the derived `married`
/// column.
pub struct RawPerson {
  pub person_id:   String,
  pub firstname:   String,
  pub surname:     String,
  pub dob:         String,
  pub gender:      Option<String>,
  pub profile_pic: Option<String>,
  pub instagram:   Option<String>,
  pub anniversary: Option<String>,
  pub role:        Option<String>,
  pub created_at:  String,
  pub married:     bool,
}

impl RawPerson {
  /// Read a row selected with [`crate::queries::PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:   row.get(0)?,
      firstname:   row.get(1)?,
      surname:     row.get(2)?,
      dob:         row.get(3)?,
      gender:      row.get(4)?,
      profile_pic: row.get(5)?,
      instagram:   row.get(6)?,
      anniversary: row.get(7)?,
      role:        row.get(8)?,
      created_at:  row.get(9)?,
      married:     row.get(10)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:   decode_uuid(&self.person_id)?,
      firstname:   self.firstname,
      surname:     self.surname,
      dob:         decode_date(&self.dob)?,
      gender:      self.gender.as_deref().map(decode_gender).transpose()?,
      profile_pic: self.profile_pic,
      instagram:   self.instagram,
      anniversary: self.anniversary.as_deref().map(decode_date).transpose()?,
      married:     self.married,
      role:        self.role.as_deref().map(decode_role),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawParentChild {
  pub parent_id:   String,
  pub child_id:    String,
  pub recorded_at: String,
}

impl RawParentChild {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      parent_id:   row.get(0)?,
      child_id:    row.get(1)?,
      recorded_at: row.get(2)?,
    })
  }

  pub fn into_edge(self) -> Result<ParentChild> {
    Ok(ParentChild {
      parent_id:   decode_uuid(&self.parent_id)?,
      child_id:    decode_uuid(&self.child_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawMarriage {
  pub marriage_id:  String,
  pub person1_id:   String,
  pub person2_id:   String,
  pub dissolved_at: Option<String>,
  pub recorded_at:  String,
}

impl RawMarriage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      marriage_id:  row.get(0)?,
      person1_id:   row.get(1)?,
      person2_id:   row.get(2)?,
      dissolved_at: row.get(3)?,
      recorded_at:  row.get(4)?,
    })
  }

  pub fn into_marriage(self) -> Result<Marriage> {
    Ok(Marriage {
      marriage_id:  decode_uuid(&self.marriage_id)?,
      person1_id:   decode_uuid(&self.person1_id)?,
      person2_id:   decode_uuid(&self.person2_id)?,
      dissolved_at: self.dissolved_at.as_deref().map(decode_dt).transpose()?,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_roles_decode_as_member() {
    assert_eq!(decode_role("ADMIN"), Role::Admin);
    assert_eq!(decode_role("MEMBER"), Role::Member);
    assert_eq!(decode_role("superuser"), Role::Member);
  }

  #[test]
  fn dates_use_iso_calendar_format() {
    let d = NaiveDate::from_ymd_opt(1987, 3, 9).unwrap();
    assert_eq!(encode_date(d), "1987-03-09");
    assert_eq!(decode_date("1987-03-09").unwrap(), d);
    assert!(decode_date("09/03/1987").is_err());
  }
}
