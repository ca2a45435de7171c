//! Edges of the lineage graph.
//!
//! Parent/child edges are directed; marriages are unordered pairs. Both are
//! append-only: once recorded they are never updated or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::person::Person;

/// `parent_id` is a parent of `child_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChild {
  pub parent_id:   Uuid,
  pub child_id:    Uuid,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marriage {
  pub marriage_id:  Uuid,
  pub person1_id:   Uuid,
  pub person2_id:   Uuid,
  /// Reserved for recording the end of a marriage. Nothing sets it yet.
  pub dissolved_at: Option<DateTime<Utc>>,
  pub recorded_at:  DateTime<Utc>,
}

impl Marriage {
  pub fn is_active(&self) -> bool { self.dissolved_at.is_none() }

  /// The other member of the couple, if `id` is one of them.
  pub fn partner_of(&self, id: Uuid) -> Option<Uuid> {
    if self.person1_id == id {
      Some(self.person2_id)
    } else if self.person2_id == id {
      Some(self.person1_id)
    } else {
      None
    }
  }
}

/// The kind of relative a mutator attaches to an existing person.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Relation {
  Father,
  Mother,
  Spouse,
  Sibling,
  Child,
}

/// Everything in the registry at once, for client-side tree rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyGraph {
  pub persons:       Vec<Person>,
  pub relationships: Vec<ParentChild>,
  pub marriages:     Vec<Marriage>,
}
