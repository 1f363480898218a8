//! Idempotent schema bootstrap.
//!
//! A community row is one aggregate document: its embedded collections live
//! in JSON array columns and are only ever rewritten by single statements
//! (see `operators`).

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY NOT NULL,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_idx ON users (email)",
    "CREATE TABLE IF NOT EXISTS communities (
        id            BLOB PRIMARY KEY NOT NULL,
        name          TEXT NOT NULL,
        description   TEXT NOT NULL,
        owner         BLOB NOT NULL,
        members       TEXT NOT NULL DEFAULT '[]' CHECK (json_valid(members)),
        announcements TEXT NOT NULL DEFAULT '[]' CHECK (json_valid(announcements)),
        events        TEXT NOT NULL DEFAULT '[]' CHECK (json_valid(events)),
        created_at    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS communities_created_idx ON communities (created_at)",
];
