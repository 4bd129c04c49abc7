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
//! Catalog facade: a named prepared-statement executor over a transactional
//! SQLite catalog. Statements are registered once at open; a lookup against
//! an unregistered name is `CatalogError::StmtMissing`, not a panic.
//!
//! `commit` and `rollback` both open a fresh transaction before returning, so
//! the facade is always "in a transaction" from the caller's point of view —
//! there is no `begin` exposed publicly, which is the type-level guard
//! against the "forgot to start/rollback a transaction" footgun: the only
//! way to get a `Catalog` is already inside one.

mod schema;

use crate::error::CatalogError;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct Catalog {
    conn: Connection,
    statements: HashSet<&'static str>,
}

impl Catalog {
    /// Open (creating if absent) the SQLite catalog at `path`, apply the
    /// schema, register the named statements, and begin the first
    /// transaction.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|source| CatalogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        schema::ensure_schema(&conn).map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut statements = HashSet::new();
        for (name, _) in schema::STATEMENTS {
            if !statements.insert(*name) {
                return Err(CatalogError::StmtDuplicate(name.to_string()));
            }
        }

        let mut catalog = Self { conn, statements };
        catalog.begin()?;
        Ok(catalog)
    }

    /// Open an in-memory catalog; used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(|source| CatalogError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        schema::ensure_schema(&conn).map_err(|source| CatalogError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let mut statements = HashSet::new();
        for (name, _) in schema::STATEMENTS {
            statements.insert(*name);
        }
        let mut catalog = Self { conn, statements };
        catalog.begin()?;
        Ok(catalog)
    }

    fn begin(&mut self) -> Result<(), CatalogError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(CatalogError::TxBegin)
    }

    /// Commit the current transaction and immediately open a fresh one.
    pub fn commit(&mut self) -> Result<(), CatalogError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(CatalogError::TxCommit)?;
        self.begin()
    }

    /// Roll back the current transaction and immediately open a fresh one.
    pub fn rollback(&mut self) -> Result<(), CatalogError> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(CatalogError::TxRollback)?;
        self.begin()
    }

    /// Tear down any open transaction with a rollback. Called on drop of the
    /// owning pipeline context, not automatically by this struct's `Drop` —
    /// callers decide whether the run ended successfully.
    pub fn close(mut self) {
        let _ = self.conn.execute_batch("ROLLBACK");
    }

    fn sql_for(&self, stmt: &str) -> Result<&'static str, CatalogError> {
        schema::STATEMENTS
            .iter()
            .find(|(name, _)| *name == stmt)
            .map(|(_, sql)| *sql)
            .filter(|_| self.statements.contains(stmt))
            .ok_or_else(|| CatalogError::StmtMissing(stmt.to_string()))
    }

    /// Run a named statement expected to return at most one row.
    pub fn query_one<T>(
        &self,
        stmt: &str,
        params: &[&dyn ToSql],
        row_map: impl FnOnce(&Row) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, CatalogError> {
        let sql = self.sql_for(stmt)?;
        let mut cached = self
            .conn
            .prepare_cached(sql)
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })?;
        cached
            .query_row(params, row_map)
            .optional()
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })
    }

    /// Run a named statement, materializing every matching row.
    pub fn query_many<T>(
        &self,
        stmt: &str,
        params: &[&dyn ToSql],
        mut row_map: impl FnMut(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, CatalogError> {
        let sql = self.sql_for(stmt)?;
        let mut cached = self
            .conn
            .prepare_cached(sql)
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })?;
        let rows = cached
            .query_map(params, &mut row_map)
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })
    }

    /// Run a named INSERT, returning the new row's id.
    pub fn insert(&self, stmt: &str, params: &[&dyn ToSql]) -> Result<u64, CatalogError> {
        let sql = self.sql_for(stmt)?;
        self.conn
            .prepare_cached(sql)
            .and_then(|mut s| s.execute(params))
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    /// Run a named UPDATE/DELETE, returning the number of rows affected.
    pub fn update(&self, stmt: &str, params: &[&dyn ToSql]) -> Result<u64, CatalogError> {
        let sql = self.sql_for(stmt)?;
        let affected = self
            .conn
            .prepare_cached(sql)
            .and_then(|mut s| s.execute(params))
            .map_err(|source| CatalogError::Exec {
                stmt: stmt.to_string(),
                source,
            })?;
        Ok(affected as u64)
    }
}
