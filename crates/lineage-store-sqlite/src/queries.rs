//! Synchronous statements run on the `tokio_rusqlite` worker thread.
//!
//! Every helper takes a plain [`Connection`]; a [`rusqlite::Transaction`]
//! derefs to one, so the same helpers compose inside a transaction. All
//! values are bound as parameters.

use chrono::{DateTime, Utc};
use lineage_core::{
  Error as CoreError,
  mutation::{self, Kinship, MaritalChecks, MutationOutcome},
  person::{NewPerson, Person, PersonPatch, Role},
  relation::{FamilyGraph, Marriage, ParentChild, Relation},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawMarriage, RawParentChild, RawPerson, decode_uuid, encode_date, encode_dt,
    encode_gender, encode_role, encode_uuid,
  },
};

/// Column list understood by [`RawPerson::from_row`]. `married` is derived
/// from the marriage table rather than stored.
pub const PERSON_COLUMNS: &str = "
  p.person_id, p.firstname, p.surname, p.dob, p.gender, p.profile_pic,
  p.instagram, p.anniversary, p.role, p.created_at,
  EXISTS (
    SELECT 1 FROM marriages m
    WHERE (m.person1_id = p.person_id OR m.person2_id = p.person_id)
      AND m.dissolved_at IS NULL
  ) AS married";

const MARRIAGE_COLUMNS: &str =
  "marriage_id, person1_id, person2_id, dissolved_at, recorded_at";

// ─── Persons ─────────────────────────────────────────────────────────────────

pub fn person_exists(conn: &Connection, id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM persons WHERE person_id = ?1",
        params![encode_uuid(id)],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn require_person(conn: &Connection, id: Uuid) -> Result<()> {
  if person_exists(conn, id)? {
    Ok(())
  } else {
    Err(CoreError::PersonNotFound(id).into())
  }
}

pub fn get_person(conn: &Connection, id: Uuid) -> Result<Option<Person>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM persons p WHERE p.person_id = ?1"),
      params![encode_uuid(id)],
      RawPerson::from_row,
    )
    .optional()?;
  raw.map(RawPerson::into_person).transpose()
}

pub fn list_persons(conn: &Connection) -> Result<Vec<Person>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PERSON_COLUMNS} FROM persons p ORDER BY p.created_at, p.rowid"
  ))?;
  let raws = stmt
    .query_map([], RawPerson::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPerson::into_person).collect()
}

pub fn find_person_by_name(
  conn: &Connection,
  firstname: &str,
  surname: &str,
) -> Result<Option<Person>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {PERSON_COLUMNS} FROM persons p
         WHERE p.firstname = ?1 AND p.surname = ?2
         ORDER BY p.created_at, p.rowid
         LIMIT 1"
      ),
      params![firstname, surname],
      RawPerson::from_row,
    )
    .optional()?;
  raw.map(RawPerson::into_person).transpose()
}

pub fn insert_person(
  conn: &Connection,
  input: &NewPerson,
  id: Uuid,
  created_at: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "INSERT INTO persons (
       person_id, firstname, surname, dob, gender, profile_pic, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(id),
      input.firstname,
      input.surname,
      encode_date(input.dob),
      input.gender.map(encode_gender),
      input.profile_pic,
      encode_dt(created_at),
    ],
  )?;
  Ok(())
}

/// Apply `patch` field by field. Returns `false` if no row matched.
pub fn merge_person(
  conn: &Connection,
  id: Uuid,
  patch: &PersonPatch,
) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE persons SET
       firstname   = COALESCE(?2, firstname),
       surname     = COALESCE(?3, surname),
       dob         = COALESCE(?4, dob),
       gender      = COALESCE(?5, gender),
       profile_pic = COALESCE(?6, profile_pic),
       instagram   = COALESCE(?7, instagram),
       anniversary = COALESCE(?8, anniversary)
     WHERE person_id = ?1",
    params![
      encode_uuid(id),
      patch.firstname,
      patch.surname,
      patch.dob.map(encode_date),
      patch.gender.map(encode_gender),
      patch.profile_pic,
      patch.instagram,
      patch.anniversary.map(encode_date),
    ],
  )?;
  Ok(changed > 0)
}

pub fn set_role(conn: &Connection, id: Uuid, role: Option<Role>) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE persons SET role = ?2 WHERE person_id = ?1",
    params![encode_uuid(id), role.map(encode_role)],
  )?;
  Ok(changed > 0)
}

// ─── Parent/child edges ──────────────────────────────────────────────────────

fn id_list(conn: &Connection, sql: &str, id: Uuid) -> Result<Vec<Uuid>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params![encode_uuid(id)], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.iter().map(|s| decode_uuid(s)).collect()
}

pub fn parents_of(conn: &Connection, child: Uuid) -> Result<Vec<Uuid>> {
  id_list(
    conn,
    "SELECT parent_id FROM parent_child WHERE child_id = ?1
     ORDER BY recorded_at, rowid",
    child,
  )
}

pub fn children_of(conn: &Connection, parent: Uuid) -> Result<Vec<Uuid>> {
  id_list(
    conn,
    "SELECT child_id FROM parent_child WHERE parent_id = ?1
     ORDER BY recorded_at, rowid",
    parent,
  )
}

fn edge_exists(conn: &Connection, parent: Uuid, child: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM parent_child WHERE parent_id = ?1 AND child_id = ?2",
        params![encode_uuid(parent), encode_uuid(child)],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// `true` if `ancestor` can be reached from `person` by following parent
/// edges upwards.
fn is_ancestor(conn: &Connection, ancestor: Uuid, person: Uuid) -> Result<bool> {
  Ok(conn.query_row(
    "WITH RECURSIVE ancestors(id) AS (
       SELECT parent_id FROM parent_child WHERE child_id = ?1
       UNION
       SELECT pc.parent_id FROM parent_child pc
       JOIN ancestors a ON pc.child_id = a.id
     )
     SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = ?2)",
    params![encode_uuid(person), encode_uuid(ancestor)],
    |row| row.get(0),
  )?)
}

fn insert_edge(
  conn: &Connection,
  parent: Uuid,
  child: Uuid,
  recorded_at: DateTime<Utc>,
) -> Result<ParentChild> {
  conn.execute(
    "INSERT INTO parent_child (parent_id, child_id, recorded_at)
     VALUES (?1, ?2, ?3)",
    params![encode_uuid(parent), encode_uuid(child), encode_dt(recorded_at)],
  )?;
  Ok(ParentChild { parent_id: parent, child_id: child, recorded_at })
}

/// Validated insert used by the direct relationship-store operation.
pub fn add_parent_child(
  conn: &Connection,
  parent: Uuid,
  child: Uuid,
  recorded_at: DateTime<Utc>,
) -> Result<ParentChild> {
  if parent == child {
    return Err(CoreError::SelfRelation(parent).into());
  }
  require_person(conn, parent)?;
  require_person(conn, child)?;
  if edge_exists(conn, parent, child)? {
    return Err(CoreError::DuplicateRelation { parent, child }.into());
  }
  if is_ancestor(conn, child, parent)? {
    return Err(CoreError::WouldCreateCycle { parent, child }.into());
  }
  insert_edge(conn, parent, child, recorded_at)
}

pub fn all_edges(conn: &Connection) -> Result<Vec<ParentChild>> {
  let mut stmt = conn.prepare(
    "SELECT parent_id, child_id, recorded_at FROM parent_child
     ORDER BY recorded_at, rowid",
  )?;
  let raws = stmt
    .query_map([], RawParentChild::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawParentChild::into_edge).collect()
}

// ─── Marriages ───────────────────────────────────────────────────────────────

pub fn add_marriage(
  conn: &Connection,
  a: Uuid,
  b: Uuid,
  recorded_at: DateTime<Utc>,
) -> Result<Marriage> {
  if a == b {
    return Err(CoreError::SelfRelation(a).into());
  }
  require_person(conn, a)?;
  require_person(conn, b)?;

  let marriage = Marriage {
    marriage_id: Uuid::new_v4(),
    person1_id: a,
    person2_id: b,
    dissolved_at: None,
    recorded_at,
  };
  conn.execute(
    "INSERT INTO marriages (marriage_id, person1_id, person2_id, dissolved_at, recorded_at)
     VALUES (?1, ?2, ?3, NULL, ?4)",
    params![
      encode_uuid(marriage.marriage_id),
      encode_uuid(a),
      encode_uuid(b),
      encode_dt(recorded_at),
    ],
  )?;
  Ok(marriage)
}

pub fn marriage_partner(conn: &Connection, person: Uuid) -> Result<Option<Uuid>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {MARRIAGE_COLUMNS} FROM marriages
         WHERE (person1_id = ?1 OR person2_id = ?1) AND dissolved_at IS NULL
         ORDER BY recorded_at DESC, rowid DESC
         LIMIT 1"
      ),
      params![encode_uuid(person)],
      RawMarriage::from_row,
    )
    .optional()?;
  Ok(
    raw
      .map(RawMarriage::into_marriage)
      .transpose()?
      .and_then(|m| m.partner_of(person)),
  )
}

pub fn are_married(conn: &Connection, a: Uuid, b: Uuid) -> Result<bool> {
  Ok(conn.query_row(
    "SELECT EXISTS (
       SELECT 1 FROM marriages
       WHERE ((person1_id = ?1 AND person2_id = ?2)
           OR (person1_id = ?2 AND person2_id = ?1))
         AND dissolved_at IS NULL
     )",
    params![encode_uuid(a), encode_uuid(b)],
    |row| row.get(0),
  )?)
}

pub fn all_marriages(conn: &Connection) -> Result<Vec<Marriage>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {MARRIAGE_COLUMNS} FROM marriages ORDER BY recorded_at, rowid"
  ))?;
  let raws = stmt
    .query_map([], RawMarriage::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawMarriage::into_marriage).collect()
}

pub fn family_graph(conn: &Connection) -> Result<FamilyGraph> {
  Ok(FamilyGraph {
    persons:       list_persons(conn)?,
    relationships: all_edges(conn)?,
    marriages:     all_marriages(conn)?,
  })
}

// ─── Mutators ────────────────────────────────────────────────────────────────

/// Read the target's neighbourhood, plan the mutation and apply it. Must run
/// inside a transaction: an error after the first write leaves the rollback
/// to the caller.
pub fn add_relative(
  conn: &Connection,
  target: Uuid,
  relation: Relation,
  input: &NewPerson,
  checks: MaritalChecks,
  now: DateTime<Utc>,
) -> Result<Option<MutationOutcome>> {
  if !person_exists(conn, target)? {
    return Ok(None);
  }

  let kin = Kinship {
    person_id: target,
    parents:   parents_of(conn, target)?,
    partner:   marriage_partner(conn, target)?,
  };
  let plan = mutation::plan(relation, &kin, input.gender, checks)?;

  let new_id = Uuid::new_v4();
  let new_person = NewPerson { gender: plan.gender, ..input.clone() };
  insert_person(conn, &new_person, new_id, now)?;

  let parent_child = plan
    .parent_links
    .iter()
    .map(|link| {
      insert_edge(conn, link.parent.resolve(new_id), link.child.resolve(new_id), now)
    })
    .collect::<Result<Vec<_>>>()?;

  let marriage = plan
    .marry
    .map(|spouse| add_marriage(conn, spouse, new_id, now))
    .transpose()?;

  let person = get_person(conn, new_id)?
    .ok_or(CoreError::PersonNotFound(new_id))?;

  Ok(Some(MutationOutcome { person, parent_child, marriage }))
}
