//! The edit-permission check.
//!
//! A person may edit their own record, the records of their direct parents,
//! children and spouse, and nothing else unless they are an admin. The check
//! looks one hop into the graph: grandparents, siblings and in-laws are not
//! granted anything.

use serde::Serialize;
use strum::Display;
use uuid::Uuid;

use crate::store::RegistryStore;

/// The rule that allowed an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Grant {
  Admin,
  SelfEdit,
  /// The target is a parent of the editor.
  Parent,
  /// The target is a child of the editor.
  Child,
  Spouse,
}

/// Evaluate whether `editor` may edit `target`, returning the first rule that
/// allows it. Rules are checked in the order of the [`Grant`] variants; an
/// editor that does not exist is never granted anything.
pub async fn evaluate<S>(
  store: &S,
  editor: Uuid,
  target: Uuid,
) -> Result<Option<Grant>, S::Error>
where
  S: RegistryStore,
{
  let Some(person) = store.get_person(editor).await? else {
    return Ok(None);
  };

  if person.is_admin() {
    return Ok(Some(Grant::Admin));
  }
  if editor == target {
    return Ok(Some(Grant::SelfEdit));
  }
  if store.parents_of(editor).await?.contains(&target) {
    return Ok(Some(Grant::Parent));
  }
  if store.children_of(editor).await?.contains(&target) {
    return Ok(Some(Grant::Child));
  }
  if store.are_married(editor, target).await? {
    return Ok(Some(Grant::Spouse));
  }
  Ok(None)
}

/// `true` if `editor` may edit `target`.
pub async fn can_edit<S>(
  store: &S,
  editor: Uuid,
  target: Uuid,
) -> Result<bool, S::Error>
where
  S: RegistryStore,
{
  Ok(evaluate(store, editor, target).await?.is_some())
}
