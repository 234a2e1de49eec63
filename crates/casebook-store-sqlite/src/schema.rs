//! SQL schema for the Casebook SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version`; there are no migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = FULL;

CREATE TABLE IF NOT EXISTS crimes (
    id            TEXT PRIMARY KEY,            -- hyphenated lowercase UUID
    title         TEXT NOT NULL DEFAULT '',
    date          TEXT NOT NULL,               -- RFC 3339 with local offset
    is_solved     INTEGER NOT NULL DEFAULT 0,  -- 0 | 1
    suspect       TEXT NOT NULL DEFAULT '',
    suspect_phone TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS crimes_date_idx ON crimes(date);

PRAGMA user_version = 1;
";
