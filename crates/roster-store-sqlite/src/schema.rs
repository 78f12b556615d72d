//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS people (
    person_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    surname     TEXT NOT NULL,
    patronymic  TEXT,
    age         INTEGER NOT NULL CHECK (age BETWEEN 0 AND 120),
    gender      TEXT CHECK (gender IN ('male', 'female', 'other')),
    nationality TEXT,            -- upper-case alpha-2 or 'unknown'
    created_at  TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; server-assigned
    updated_at  TEXT NOT NULL
);

-- Listing order: newest first, identifier breaks ties.
CREATE INDEX IF NOT EXISTS people_created_idx     ON people(created_at DESC, person_id DESC);
CREATE INDEX IF NOT EXISTS people_nationality_idx ON people(nationality);
CREATE INDEX IF NOT EXISTS people_age_idx         ON people(age);

-- Raw upstream payloads for the enrichment lookups.
-- Rows are never deleted; expired rows are ignored on read and overwritten
-- on the next write.
CREATE TABLE IF NOT EXISTS lookup_cache (
    cache_key  TEXT PRIMARY KEY,
    value      BLOB NOT NULL,
    expires_at TEXT NOT NULL
);

PRAGMA user_version = 1;
";

/// Name of the SQL function registered for case-insensitive substring
/// matching; folds with the same rules as [`roster_core::filter::fold_case`].
pub const CASEFOLD_FN: &str = "casefold";
