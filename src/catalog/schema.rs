// ─────────────────────────────────────────────────────────────────────────────
// Custodian v0.1.0
// Copyright 2026 The Custodian Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
// ─────────────────────────────────────────────────────────────────────────────
//! Catalog schema DDL and the fixed prepared-statement registry.

use rusqlite::Connection;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS directory (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL,
    name      TEXT NOT NULL,
    UNIQUE(parent_id, name)
);
CREATE TABLE IF NOT EXISTS file (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL,
    name      TEXT NOT NULL,
    UNIQUE(parent_id, name)
);
CREATE TABLE IF NOT EXISTS archive (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    contents TEXT NOT NULL,
    blake2b  TEXT,
    sha3     TEXT
);
CREATE TABLE IF NOT EXISTS file_revision (
    file_id      INTEGER NOT NULL,
    archive_time TEXT NOT NULL,
    archive      INTEGER NOT NULL,
    size         INTEGER NOT NULL,
    blake2b      TEXT NOT NULL,
    sha3         TEXT NOT NULL,
    PRIMARY KEY (file_id, archive_time)
);
CREATE TABLE IF NOT EXISTS file_duplicate (
    file_id                     INTEGER NOT NULL,
    archive_time                TEXT NOT NULL,
    duplicate_file_id           INTEGER NOT NULL,
    duplicate_file_archive_time TEXT NOT NULL,
    PRIMARY KEY (file_id, archive_time)
);
CREATE TABLE IF NOT EXISTS single_archive_hash (
    file_id      INTEGER NOT NULL,
    archive_time TEXT NOT NULL,
    blake2b      TEXT NOT NULL,
    sha3         TEXT NOT NULL,
    PRIMARY KEY (file_id, archive_time)
);
"#;

/// Named statement registry: `(name, sql)`. A lookup against a name not in
/// this table is a programming error (`CatalogStmtMissing`), not a data error.
pub const STATEMENTS: &[(&str, &str)] = &[
    (
        "archive.current_id_for_contents",
        "SELECT IFNULL(MAX(id), 0) FROM archive WHERE contents = ?1",
    ),
    (
        "archive.size_by_id",
        "SELECT IFNULL(SUM(size), 0) FROM file_revision WHERE archive = ?1",
    ),
    ("archive.insert", "INSERT INTO archive (contents) VALUES (?1)"),
    (
        "archive.contents_by_id",
        "SELECT contents FROM archive WHERE id = ?1",
    ),
    ("archive.max_id", "SELECT IFNULL(MAX(id), 0) FROM archive"),
    (
        "archive.hashes_by_id",
        "SELECT blake2b, sha3 FROM archive WHERE id = ?1",
    ),
    (
        "archive.update_hashes_by_id",
        "UPDATE archive SET blake2b = ?1, sha3 = ?2 WHERE id = ?3",
    ),
    (
        "archive.replace_single_hash",
        "INSERT OR REPLACE INTO single_archive_hash(file_id, archive_time, blake2b, sha3) VALUES (?1, ?2, ?3, ?4)",
    ),
    (
        "archive.all_single_hashes",
        "SELECT file_id, archive_time, blake2b, sha3 FROM single_archive_hash",
    ),
    (
        "directory.insert",
        "INSERT INTO directory (name, parent_id) VALUES (?1, ?2)",
    ),
    (
        "directory.by_name_and_parent",
        "SELECT id FROM directory WHERE name = ?1 AND parent_id = ?2",
    ),
    (
        "directory.child_directories",
        "SELECT id, name FROM directory WHERE parent_id = ?1 AND name <> '/'",
    ),
    (
        "directory.child_files",
        "SELECT id, name FROM file WHERE parent_id = ?1",
    ),
    ("file.insert", "INSERT INTO file (name, parent_id) VALUES (?1, ?2)"),
    (
        "file.by_name_and_parent",
        "SELECT id FROM file WHERE name = ?1 AND parent_id = ?2",
    ),
    (
        "file.revision_by_size_and_hashes",
        "SELECT file_id, archive_time FROM file_revision WHERE size = ?1 AND blake2b = ?2 AND sha3 = ?3",
    ),
    (
        "file.insert_new_revision",
        "INSERT INTO file_revision (file_id, size, archive, blake2b, sha3, archive_time) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    ),
    (
        "file.insert_duplicate_revision",
        "INSERT INTO file_duplicate (file_id, duplicate_file_id, duplicate_file_archive_time, archive_time) VALUES (?1, ?2, ?3, ?4)",
    ),
    (
        "file.most_recent_revision_info",
        "SELECT file_id, revision_archive_time, archive FROM ( \
            SELECT file_id, archive_time AS revision_archive_time, archive, archive_time AS sort_time FROM file_revision WHERE file_id = ?1 \
            UNION ALL \
            SELECT r.file_id, r.archive_time AS revision_archive_time, r.archive, d.archive_time AS sort_time \
            FROM file_duplicate d JOIN file_revision r \
              ON r.file_id = d.duplicate_file_id AND r.archive_time = d.duplicate_file_archive_time \
            WHERE d.file_id = ?2 \
         ) AS revisions ORDER BY sort_time DESC LIMIT 1",
    ),
    (
        "file.all_single_archive_revisions",
        "SELECT file_id, archive_time FROM file_revision WHERE archive = 1",
    ),
];

/// Create the schema (idempotent) and seed the root directory and the
/// reserved `<SINGLE>` container if this is a fresh catalog.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;

    let root_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM directory WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    if root_exists == 0 {
        conn.execute(
            "INSERT INTO directory (id, parent_id, name) VALUES (1, 0, '/')",
            [],
        )?;
    }

    let single_exists: i64 =
        conn.query_row("SELECT COUNT(*) FROM archive WHERE id = 1", [], |row| row.get(0))?;
    if single_exists == 0 {
        conn.execute(
            "INSERT INTO archive (id, contents, blake2b, sha3) VALUES (1, '<SINGLE>', NULL, NULL)",
            [],
        )?;
    }

    Ok(())
}
