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
//! JSON configuration file (default path `settings.json`), matching the
//! external interface described for this tool's persisted settings.

use crate::error::ConfigError;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub archive: ArchiveConfig,
    pub database: DatabaseConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Buffer size, in bytes, used while streaming a file through the hashers.
    pub file_read_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub archive_directory: PathBuf,
    pub temp_archive_directory: PathBuf,
    pub target_size: u64,
    pub single_archive_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Path to the SQLite catalog file.
    pub location: PathBuf,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Reserved, unused by the core pipeline.
    pub access_key: String,
    pub secret_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            archive: ArchiveConfig::default(),
            database: DatabaseConfig::default(),
            aws: AwsConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            file_read_size: 1 << 20,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_directory: PathBuf::from("./archive"),
            temp_archive_directory: PathBuf::from("./tmp"),
            target_size: 1 << 30,
            single_archive_size: 100 * (1 << 20),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            location: PathBuf::from("./catalog.sqlite3"),
            options: Vec::new(),
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

impl Config {
    /// Load and parse the configuration file at `path`. The file itself must
    /// exist — there is no sensible archive/temp directory to guess for a
    /// real run — but any section or field it omits falls back to the
    /// corresponding `Default` impl, per each struct's `#[serde(default)]`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render the configuration for `--debug` startup logging, redacting the
    /// database password and AWS secret key.
    pub fn redacted_summary(&self) -> String {
        format!(
            "Loaded Configuration {{\n\
             \tgeneral {{ file_read_size: {} }}\n\
             \tarchive {{ archive_directory: {}, target_size: {}, single_archive_size: {}, temp_archive_directory: {} }}\n\
             \tdatabase {{ {} }}\n\
             \taws {{ {} }}\n\
             }}",
            self.general.file_read_size,
            self.archive.archive_directory.display(),
            self.archive.target_size,
            self.archive.single_archive_size,
            self.archive.temp_archive_directory.display(),
            "[redacted]".dimmed(),
            "[redacted]".dimmed(),
        )
    }
}
