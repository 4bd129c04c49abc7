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
// Typed error kinds for the archival pipeline. Each variant carries the
// context a caller needs to react to it (container id, path, statement name)
// rather than forcing everything through one opaque error type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("the prepared statement \"{0}\" does not exist")]
    StmtMissing(String),

    #[error("the prepared statement \"{0}\" has already been registered")]
    StmtDuplicate(String),

    #[error("error executing statement \"{stmt}\": {source}")]
    Exec {
        stmt: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("could not begin a new catalog transaction: {0}")]
    TxBegin(#[source] rusqlite::Error),

    #[error("could not commit the catalog transaction: {0}")]
    TxCommit(#[source] rusqlite::Error),

    #[error("could not roll back the catalog transaction: {0}")]
    TxRollback(#[source] rusqlite::Error),

    #[error("could not open the catalog database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to walk path \"{path}\": {source}")]
    PathWalk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat \"{path}\": {source}")]
    PathStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open \"{path}\": {source}")]
    PathOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to hash \"{path}\": {source}")]
    HashIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("the compressor failed for container {0}")]
    CompressorFailure(u64),

    #[error("read-back mismatch for container {id}, revision \"{name}\"")]
    ReadbackMismatch { id: u64, name: String },

    #[error("stored hash for container {0} does not match the on-disk artifact")]
    ArchiveHashMismatch(u64),

    #[error("\"{0}\" is not tracked by the catalog")]
    PathNotInAnyArchive(PathBuf),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open configuration file \"{path}\": {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration file \"{path}\": {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
