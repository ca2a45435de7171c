//! Relationship mutators: deciding which person and edges an
//! "add relative" request produces.
//!
//! Planning is pure. A backend reads a [`Kinship`] snapshot of the target,
//! calls [`plan`], and applies the resulting [`Plan`] in the same transaction
//! as the read. A precondition failure is returned before anything is
//! written.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  person::{Gender, Person},
  relation::{Marriage, ParentChild, Relation},
};

/// Whether mutators check marital state before attaching a spouse or child.
///
/// `Relaxed` drops both checks: a married person can gain a second spouse and
/// an unmarried person can gain a child. `Strict` rejects both.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaritalChecks {
  #[default]
  Relaxed,
  Strict,
}

/// The one-hop neighbourhood of a mutator's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kinship {
  pub person_id: Uuid,
  pub parents:   Vec<Uuid>,
  /// Partner in the most recent active marriage.
  pub partner:   Option<Uuid>,
}

impl Kinship {
  pub fn is_married(&self) -> bool { self.partner.is_some() }
}

/// One side of a planned edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
  Existing(Uuid),
  /// The person the mutator is about to create.
  Created,
}

impl Endpoint {
  pub fn resolve(self, created: Uuid) -> Uuid {
    match self {
      Self::Existing(id) => id,
      Self::Created => created,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
  pub parent: Endpoint,
  pub child:  Endpoint,
}

/// The writes a mutator performs after creating the new person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
  /// Gender to record on the new person; overrides the request for parents.
  pub gender:       Option<Gender>,
  pub parent_links: Vec<PlannedLink>,
  /// Marry the new person to this existing person.
  pub marry:        Option<Uuid>,
}

/// Decide what adding `relation` to the person described by `kin` means.
pub fn plan(
  relation: Relation,
  kin: &Kinship,
  requested_gender: Option<Gender>,
  checks: MaritalChecks,
) -> Result<Plan> {
  let target = Endpoint::Existing(kin.person_id);
  let strict = checks == MaritalChecks::Strict;

  let plan = match relation {
    Relation::Father | Relation::Mother => Plan {
      gender:       Some(if relation == Relation::Father {
        Gender::Male
      } else {
        Gender::Female
      }),
      parent_links: vec![PlannedLink { parent: Endpoint::Created, child: target }],
      marry:        None,
    },

    Relation::Spouse => {
      if strict && kin.is_married() {
        return Err(Error::AlreadyMarried(kin.person_id));
      }
      Plan {
        gender:       requested_gender,
        parent_links: Vec::new(),
        marry:        Some(kin.person_id),
      }
    }

    Relation::Sibling => {
      if kin.parents.is_empty() {
        return Err(Error::NoParents(kin.person_id));
      }
      Plan {
        gender:       requested_gender,
        parent_links: kin
          .parents
          .iter()
          .map(|p| PlannedLink {
            parent: Endpoint::Existing(*p),
            child:  Endpoint::Created,
          })
          .collect(),
        marry:        None,
      }
    }

    Relation::Child => {
      if strict && !kin.is_married() {
        return Err(Error::NotMarried(kin.person_id));
      }
      let parent_links = std::iter::once(kin.person_id)
        .chain(kin.partner)
        .map(|p| PlannedLink {
          parent: Endpoint::Existing(p),
          child:  Endpoint::Created,
        })
        .collect();
      Plan { gender: requested_gender, parent_links, marry: None }
    }
  };

  Ok(plan)
}

/// What a mutator created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationOutcome {
  pub person:       Person,
  pub parent_child: Vec<ParentChild>,
  pub marriage:     Option<Marriage>,
}
