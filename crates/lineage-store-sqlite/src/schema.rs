//! SQL schema for the lineage SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Persons are never deleted.
CREATE TABLE IF NOT EXISTS persons (
    person_id   TEXT PRIMARY KEY,
    firstname   TEXT NOT NULL,
    surname     TEXT NOT NULL,
    dob         TEXT NOT NULL,   -- YYYY-MM-DD
    gender      TEXT,            -- 'male' | 'female' | 'other'
    profile_pic TEXT,            -- URI into the photo store
    instagram   TEXT,
    anniversary TEXT,            -- YYYY-MM-DD
    role        TEXT,            -- 'ADMIN' | 'MEMBER' | NULL
    created_at  TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
);

-- Edges are strictly append-only.
-- No UPDATE or DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS parent_child (
    parent_id   TEXT NOT NULL REFERENCES persons(person_id),
    child_id    TEXT NOT NULL REFERENCES persons(person_id),
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (parent_id, child_id),
    CHECK (parent_id != child_id)
);

CREATE TABLE IF NOT EXISTS marriages (
    marriage_id  TEXT PRIMARY KEY,
    person1_id   TEXT NOT NULL REFERENCES persons(person_id),
    person2_id   TEXT NOT NULL REFERENCES persons(person_id),
    dissolved_at TEXT,           -- NULL while the marriage is active
    recorded_at  TEXT NOT NULL,
    CHECK (person1_id != person2_id)
);

CREATE INDEX IF NOT EXISTS persons_name_idx      ON persons(firstname, surname);
CREATE INDEX IF NOT EXISTS parent_child_child_idx ON parent_child(child_id);
CREATE INDEX IF NOT EXISTS marriages_person1_idx ON marriages(person1_id);
CREATE INDEX IF NOT EXISTS marriages_person2_idx ON marriages(person2_id);

PRAGMA user_version = 1;
";
