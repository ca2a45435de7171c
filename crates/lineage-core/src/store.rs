//! The `RegistryStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `lineage-store-sqlite`). The API layer depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  mutation::MutationOutcome,
  person::{NewPerson, Person, PersonPatch, Role},
  relation::{FamilyGraph, Marriage, ParentChild, Relation},
};

/// Backend errors that may wrap a domain [`crate::Error`].
///
/// Lets callers tell "the graph is in the wrong shape" apart from "the
/// database failed" without knowing the backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_domain(&self) -> Option<&crate::Error>;
}

impl StoreError for crate::Error {
  fn as_domain(&self) -> Option<&crate::Error> { Some(self) }
}

/// Abstraction over a lineage registry backend.
///
/// Persons are never deleted and edges are append-only. Every method that
/// writes more than one row must apply all of its writes or none of them.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: StoreError;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Create and persist a person with no relationships.
  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// All persons, oldest first.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Exact match on first name and surname; the earliest created wins.
  fn find_person_by_name<'a>(
    &'a self,
    firstname: &'a str,
    surname: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Merge `patch` into the stored record; `None` fields are left untouched.
  /// Returns the merged person, or `None` if `id` does not exist.
  fn update_person(
    &self,
    id: Uuid,
    patch: PersonPatch,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Set or clear a person's role. Returns `None` if `id` does not exist.
  fn set_role(
    &self,
    id: Uuid,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  // ── Relationships: append-only writes ─────────────────────────────────

  /// Record that `parent` is a parent of `child`.
  ///
  /// Fails if either person is missing, if the edge already exists, or if it
  /// would make a person their own ancestor.
  fn add_parent_child(
    &self,
    parent: Uuid,
    child: Uuid,
  ) -> impl Future<Output = Result<ParentChild, Self::Error>> + Send + '_;

  /// Record a marriage between two distinct existing persons.
  fn add_marriage(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<Marriage, Self::Error>> + Send + '_;

  // ── Relationship reads ────────────────────────────────────────────────

  fn parents_of(
    &self,
    child: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  fn children_of(
    &self,
    parent: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Partner in the most recently recorded active marriage, if any.
  fn marriage_partner(
    &self,
    person: Uuid,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  /// `true` if an active marriage links `a` and `b`, in either order.
  fn are_married(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every person, parent/child edge and marriage in the registry.
  fn family_graph(
    &self,
  ) -> impl Future<Output = Result<FamilyGraph, Self::Error>> + Send + '_;

  // ── Mutators ──────────────────────────────────────────────────────────

  /// Create `input` as the `relation` of `target` and wire it into the graph
  /// as one atomic unit (see [`crate::mutation::plan`]).
  ///
  /// Returns `None` if `target` does not exist. Precondition failures are
  /// reported as errors carrying the domain error; nothing is written.
  fn add_relative(
    &self,
    target: Uuid,
    relation: Relation,
    input: NewPerson,
  ) -> impl Future<Output = Result<Option<MutationOutcome>, Self::Error>> + Send + '_;
}
