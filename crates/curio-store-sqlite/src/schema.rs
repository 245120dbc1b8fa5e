//! SQL schema and table metadata for the emulated remote store.
//!
//! Executed once at connection startup. The tables mirror the hosted
//! catalogue schema; child rows cascade when their artifact is deleted.

use curio_core::client::Table;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Text columns reject empty strings, matching the constraints on the hosted
/// tables.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS artifacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL CHECK (name <> ''),
    object_id   TEXT NOT NULL CHECK (object_id <> ''),
    date        TEXT NOT NULL CHECK (date <> ''),
    dimensions  TEXT NOT NULL CHECK (dimensions <> ''),
    description TEXT NOT NULL CHECK (description <> '')
);

CREATE TABLE IF NOT EXISTS artifact_images (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    artifact_id INTEGER NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE,
    caption     TEXT NOT NULL CHECK (caption <> ''),
    url         TEXT NOT NULL CHECK (url <> '')
);

-- At most one AR image per artifact; writes go through upsert.
CREATE TABLE IF NOT EXISTS artifact_ar_images (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    artifact_id INTEGER NOT NULL UNIQUE REFERENCES artifacts(id) ON DELETE CASCADE,
    url         TEXT NOT NULL CHECK (url <> '')
);

-- One row per like; only ever counted.
CREATE TABLE IF NOT EXISTS likes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    artifact_id INTEGER NOT NULL REFERENCES artifacts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS artifact_images_artifact_idx ON artifact_images(artifact_id);
CREATE INDEX IF NOT EXISTS likes_artifact_idx           ON likes(artifact_id);
CREATE INDEX IF NOT EXISTS artifacts_name_idx           ON artifacts(name);

PRAGMA user_version = 1;
";

/// Column on every child table that points at `artifacts.id`.
pub const PARENT_KEY: &str = "artifact_id";

/// How a child table nests under its parent in a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
  /// Array of rows, ordered by id.
  Many,
  /// A single row object or `null`.
  One,
  /// `{"count": n}`; only the `count` pseudo-column may be selected.
  Count,
}

pub fn columns(table: Table) -> &'static [&'static str] {
  match table {
    Table::Artifacts => {
      &["id", "name", "object_id", "date", "dimensions", "description"]
    }
    Table::ArtifactImages => &["id", "artifact_id", "caption", "url"],
    Table::ArtifactArImages => &["id", "artifact_id", "url"],
    Table::Likes => &["id", "artifact_id"],
  }
}

/// Find the canonical `&'static str` for a known column of `table`.
pub fn column(table: Table, name: &str) -> Option<&'static str> {
  columns(table).iter().copied().find(|c| *c == name)
}

pub fn nesting(parent: Table, child: Table) -> Option<Nesting> {
  match (parent, child) {
    (Table::Artifacts, Table::ArtifactImages) => Some(Nesting::Many),
    (Table::Artifacts, Table::ArtifactArImages) => Some(Nesting::One),
    (Table::Artifacts, Table::Likes) => Some(Nesting::Count),
    _ => None,
  }
}
