//! SQL schema for the Canvass SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.
//!
//! Cross-entity references deliberately carry no FOREIGN KEY clauses:
//! assignments, variants, and `first_leader` pointers must survive the
//! soft-deletion of the rows they reference. Referential checks live in the
//! transaction layer instead.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS sponsors (
    sponsor_id  TEXT PRIMARY KEY,
    given_name  TEXT NOT NULL DEFAULT '',
    family_name TEXT NOT NULL DEFAULT '',
    phone       TEXT NOT NULL DEFAULT '',
    email       TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leaders (
    leader_id     TEXT PRIMARY KEY,
    given_name    TEXT NOT NULL DEFAULT '',
    family_name   TEXT NOT NULL DEFAULT '',
    phone         TEXT NOT NULL DEFAULT '',
    email         TEXT NOT NULL DEFAULT '',
    sponsor_id    TEXT,
    objective     TEXT,
    duplicate_log TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS voters (
    voter_id     TEXT PRIMARY KEY,
    given_name   TEXT NOT NULL DEFAULT '',
    family_name  TEXT NOT NULL DEFAULT '',
    address      TEXT NOT NULL DEFAULT '',
    phone        TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    first_leader TEXT,              -- set once; changed only by leader rename
    created_at   TEXT NOT NULL
);

-- Captures are strictly append-only: one row per ingestion attempt, never
-- updated. Idempotency covers processed rows only, so rejected attempts can
-- themselves be logged.
CREATE TABLE IF NOT EXISTS captures (
    capture_id   TEXT PRIMARY KEY,
    leader_id    TEXT NOT NULL,
    reported_id  TEXT NOT NULL,
    given_name   TEXT NOT NULL DEFAULT '',
    family_name  TEXT NOT NULL DEFAULT '',
    address      TEXT NOT NULL DEFAULT '',
    phone        TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    content_hash TEXT NOT NULL,
    status       TEXT NOT NULL,    -- 'PROCESSED' | 'REJECTED_DUPLICATE' | 'ERROR'
    canonical_id TEXT,
    actor        TEXT NOT NULL,
    recorded_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS captures_dedup_idx
    ON captures(leader_id, reported_id, content_hash)
    WHERE status = 'PROCESSED';

-- Variants are historized: superseded rows are retained, never deleted.
CREATE TABLE IF NOT EXISTS variants (
    variant_id   TEXT PRIMARY KEY,
    voter_id     TEXT NOT NULL,
    leader_id    TEXT NOT NULL,
    capture_id   TEXT NOT NULL,
    given_name   TEXT NOT NULL DEFAULT '',
    family_name  TEXT NOT NULL DEFAULT '',
    address      TEXT NOT NULL DEFAULT '',
    phone        TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    content_hash TEXT NOT NULL,
    is_current   INTEGER NOT NULL DEFAULT 1,
    recorded_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS variants_current_idx
    ON variants(voter_id, leader_id)
    WHERE is_current = 1;

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id TEXT PRIMARY KEY,
    voter_id      TEXT NOT NULL,
    leader_id     TEXT NOT NULL,
    assigned_by   TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE (voter_id, leader_id)
);

-- Incidents are append-only review records; no UPDATE or DELETE is ever
-- issued against this table.
CREATE TABLE IF NOT EXISTS incidents (
    incident_id     TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,
    voter_id        TEXT NOT NULL,
    prior_leader_id TEXT,
    new_leader_id   TEXT,
    detail          TEXT NOT NULL,
    actor           TEXT NOT NULL,
    recorded_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archived_sponsors (
    archive_id  TEXT PRIMARY KEY,
    sponsor_id  TEXT NOT NULL,
    given_name  TEXT NOT NULL,
    family_name TEXT NOT NULL,
    phone       TEXT NOT NULL,
    email       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    deleted_by  TEXT NOT NULL,
    reason      TEXT NOT NULL,
    deleted_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archived_leaders (
    archive_id    TEXT PRIMARY KEY,
    leader_id     TEXT NOT NULL,
    given_name    TEXT NOT NULL,
    family_name   TEXT NOT NULL,
    phone         TEXT NOT NULL,
    email         TEXT NOT NULL,
    sponsor_id    TEXT,
    objective     TEXT,
    duplicate_log TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    deleted_by    TEXT NOT NULL,
    reason        TEXT NOT NULL,
    deleted_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archived_voters (
    archive_id   TEXT PRIMARY KEY,
    voter_id     TEXT NOT NULL,
    given_name   TEXT NOT NULL,
    family_name  TEXT NOT NULL,
    address      TEXT NOT NULL,
    phone        TEXT NOT NULL,
    email        TEXT NOT NULL,
    first_leader TEXT,
    created_at   TEXT NOT NULL,
    deleted_by   TEXT NOT NULL,
    reason       TEXT NOT NULL,
    deleted_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id   TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    action      TEXT NOT NULL,
    actor       TEXT NOT NULL,
    detail      TEXT NOT NULL DEFAULT '{}',
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS captures_leader_idx    ON captures(leader_id);
CREATE INDEX IF NOT EXISTS captures_reported_idx  ON captures(reported_id);
CREATE INDEX IF NOT EXISTS variants_voter_idx     ON variants(voter_id, leader_id);
CREATE INDEX IF NOT EXISTS assignments_voter_idx  ON assignments(voter_id);
CREATE INDEX IF NOT EXISTS assignments_leader_idx ON assignments(leader_id);
CREATE INDEX IF NOT EXISTS incidents_voter_idx    ON incidents(voter_id);
CREATE INDEX IF NOT EXISTS incidents_kind_idx     ON incidents(kind);
CREATE INDEX IF NOT EXISTS action_entity_idx      ON action_log(entity_kind, entity_id);

PRAGMA user_version = 1;
";
