//! [`SqliteStore`]: the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::Utc;
use lineage_core::{
  mutation::{MaritalChecks, MutationOutcome},
  person::{NewPerson, Person, PersonPatch, Role},
  relation::{FamilyGraph, Marriage, ParentChild, Relation},
  store::RegistryStore,
};
use rusqlite::{Connection, Transaction};
use uuid::Uuid;

use crate::{Error, Result, queries, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lineage registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  checks: MaritalChecks,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, checks: MaritalChecks::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, checks: MaritalChecks::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Choose whether mutators check marital state (see [`MaritalChecks`]).
  pub fn with_marital_checks(mut self, checks: MaritalChecks) -> Self {
    self.checks = checks;
    self
  }

  pub fn marital_checks(&self) -> MaritalChecks { self.checks }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(&*conn))).await?
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds. Any
  /// error drops the transaction, which rolls back every write `f` made.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    input.validate()?;
    let id = Uuid::new_v4();
    let now = Utc::now();

    let person = self
      .write(move |tx| {
        queries::insert_person(tx, &input, id, now)?;
        queries::get_person(tx, id)
      })
      .await?
      .ok_or(lineage_core::Error::PersonNotFound(id))?;

    tracing::debug!(person_id = %person.person_id, "created person");
    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    self.read(move |conn| queries::get_person(conn, id)).await
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    self.read(queries::list_persons).await
  }

  async fn find_person_by_name(
    &self,
    firstname: &str,
    surname: &str,
  ) -> Result<Option<Person>> {
    let (firstname, surname) = (firstname.to_owned(), surname.to_owned());
    self
      .read(move |conn| queries::find_person_by_name(conn, &firstname, &surname))
      .await
  }

  async fn update_person(
    &self,
    id: Uuid,
    patch: PersonPatch,
  ) -> Result<Option<Person>> {
    self
      .write(move |tx| {
        if !queries::merge_person(tx, id, &patch)? {
          return Ok(None);
        }
        queries::get_person(tx, id)
      })
      .await
  }

  async fn set_role(&self, id: Uuid, role: Option<Role>) -> Result<Option<Person>> {
    self
      .write(move |tx| {
        if !queries::set_role(tx, id, role)? {
          return Ok(None);
        }
        queries::get_person(tx, id)
      })
      .await
  }

  // ── Relationships: append-only writes ─────────────────────────────────────

  async fn add_parent_child(&self, parent: Uuid, child: Uuid) -> Result<ParentChild> {
    let now = Utc::now();
    self
      .write(move |tx| queries::add_parent_child(tx, parent, child, now))
      .await
  }

  async fn add_marriage(&self, a: Uuid, b: Uuid) -> Result<Marriage> {
    let now = Utc::now();
    self.write(move |tx| queries::add_marriage(tx, a, b, now)).await
  }

  // ── Relationship reads ────────────────────────────────────────────────────

  async fn parents_of(&self, child: Uuid) -> Result<Vec<Uuid>> {
    self.read(move |conn| queries::parents_of(conn, child)).await
  }

  async fn children_of(&self, parent: Uuid) -> Result<Vec<Uuid>> {
    self.read(move |conn| queries::children_of(conn, parent)).await
  }

  async fn marriage_partner(&self, person: Uuid) -> Result<Option<Uuid>> {
    self.read(move |conn| queries::marriage_partner(conn, person)).await
  }

  async fn are_married(&self, a: Uuid, b: Uuid) -> Result<bool> {
    self.read(move |conn| queries::are_married(conn, a, b)).await
  }

  async fn family_graph(&self) -> Result<FamilyGraph> {
    self.read(queries::family_graph).await
  }

  // ── Mutators ──────────────────────────────────────────────────────────────

  async fn add_relative(
    &self,
    target: Uuid,
    relation: Relation,
    input: NewPerson,
  ) -> Result<Option<MutationOutcome>> {
    input.validate()?;
    let checks = self.checks;
    let now = Utc::now();

    let outcome = self
      .write(move |tx| queries::add_relative(tx, target, relation, &input, checks, now))
      .await?;

    if let Some(o) = &outcome {
      tracing::debug!(
        %target,
        %relation,
        person_id = %o.person.person_id,
        edges = o.parent_child.len(),
        married = o.marriage.is_some(),
        "added relative"
      );
    }
    Ok(outcome)
  }
}
