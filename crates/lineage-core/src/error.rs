//! Error types for `lineage-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("person {0} has no recorded parents")]
  NoParents(Uuid),

  #[error("person {0} is already married")]
  AlreadyMarried(Uuid),

  #[error("person {0} is not married")]
  NotMarried(Uuid),

  #[error("a person cannot be related to themself: {0}")]
  SelfRelation(Uuid),

  #[error("{parent} is already recorded as a parent of {child}")]
  DuplicateRelation { parent: Uuid, child: Uuid },

  #[error("{parent} is a descendant of {child}; the edge would create a cycle")]
  WouldCreateCycle { parent: Uuid, child: Uuid },

  #[error("invalid {field}: {reason}")]
  InvalidField {
    field:  &'static str,
    reason: String,
  },
}

impl Error {
  /// `true` for failures of a mutator precondition (the request was
  /// well-formed but the graph is in the wrong shape for it).
  pub fn is_precondition(&self) -> bool {
    matches!(
      self,
      Self::NoParents(_) | Self::AlreadyMarried(_) | Self::NotMarried(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
