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
//! The staging area holds raw file bytes, per revision, awaiting compression:
//! `<temp>/<container_id>/<file_id>_<archive_time>`. Loading an existing
//! compressed container back into staging is idempotent — a no-op if the
//! directory already exists.

use crate::compressor::Compressor;
use crate::error::ArchiveError;
use crate::hashing::hash_file;
use crate::utils::format_revision_name;
use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};

pub fn container_staging_dir(temp_root: &Path, container_id: u64) -> PathBuf {
    temp_root.join(container_id.to_string())
}

pub fn revision_staging_path(
    temp_root: &Path,
    container_id: u64,
    file_id: u64,
    archive_time: DateTime<Utc>,
) -> PathBuf {
    container_staging_dir(temp_root, container_id).join(format_revision_name(file_id, archive_time))
}

/// Copy `src` into the staging area at `<temp>/<container_id>/<file_id>_<archive_time>`,
/// always as a fresh file (no append).
pub fn stage_file(
    temp_root: &Path,
    container_id: u64,
    file_id: u64,
    archive_time: DateTime<Utc>,
    src: &Path,
) -> Result<PathBuf, ArchiveError> {
    let dir = container_staging_dir(temp_root, container_id);
    std::fs::create_dir_all(&dir)?;
    let dest = revision_staging_path(temp_root, container_id, file_id, archive_time);
    std::fs::copy(src, &dest)?;
    Ok(dest)
}

/// If the container's on-disk compressed artifact has not already been
/// loaded into staging (the staging directory is absent), extract it there
/// and verify the catalog-recorded hashes against the extracted bytes of
/// `expect_one` if given (container 1 callers verify per-revision instead).
pub fn load_if_unloaded(
    compressor: &dyn Compressor,
    artifact: &Path,
    temp_root: &Path,
    container_id: u64,
) -> Result<(), ArchiveError> {
    let dir = container_staging_dir(temp_root, container_id);
    if dir.exists() {
        return Ok(());
    }
    if !artifact.exists() {
        return Ok(());
    }
    compressor.decompress(artifact, &dir)?;
    Ok(())
}

/// Verify every file under `staged_dir` hashes to the same `(blake2b, sha3)`
/// pair as recorded, used after `load_if_unloaded` to catch a compressed
/// artifact that has drifted from the catalog.
pub fn verify_loaded_hashes(
    staged_path: &Path,
    expected_blake2b: &str,
    expected_sha3: &str,
    buffer_size: usize,
) -> Result<bool, ArchiveError> {
    let hashes = hash_file(staged_path, buffer_size)?;
    Ok(hex::encode(&hashes.blake2b) == expected_blake2b && hex::encode(&hashes.sha3) == expected_sha3)
}

/// Byte-compare two files by streaming both through equal-size chunks.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, ArchiveError> {
    let meta_a = std::fs::metadata(a)?;
    let meta_b = std::fs::metadata(b)?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let mut fa = std::fs::File::open(a)?;
    let mut fb = std::fs::File::open(b)?;
    let mut buf_a = [0u8; 65536];
    let mut buf_b = [0u8; 65536];

    loop {
        let na = fa.read(&mut buf_a)?;
        let nb = fb.read(&mut buf_b)?;
        if na != nb {
            return Ok(false);
        }
        if na == 0 {
            return Ok(true);
        }
        if buf_a[..na] != buf_b[..nb] {
            return Ok(false);
        }
    }
}
