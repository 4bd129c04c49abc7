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
//! Standalone integrity audit (§4.7): generate or check the catalog's
//! recorded hashes for every archive container's compressed artifact.

use crate::catalog::Catalog;
use crate::error::ArchiveError;
use crate::hashing::hash_file;
use crate::placement::SINGLE_CONTAINER_ID;
use crate::revision::ArchiveLayout;

fn container_artifact_path(catalog: &Catalog, layout: &ArchiveLayout, id: u64) -> Result<Option<std::path::PathBuf>, ArchiveError> {
    let contents: Option<String> = catalog.query_one(
        "archive.contents_by_id",
        &[&(id as i64)],
        |row| row.get(0),
    )?;
    if contents.is_none() {
        return Ok(None);
    }
    let sealed_path = layout.container_full_path(id);
    let part_path = layout.container_part_path(id);
    if sealed_path.exists() {
        Ok(Some(sealed_path))
    } else if part_path.exists() {
        Ok(Some(part_path))
    } else {
        Ok(None)
    }
}

/// For each container `1..=max(id)`, hash its on-disk artifact (container 1
/// hashed per single-revision artifact) and write the digest into the
/// catalog.
pub fn generate_all_container_hashes(catalog: &Catalog, layout: &ArchiveLayout, file_read_size: usize) -> Result<(), ArchiveError> {
    let max_id: u64 = catalog
        .query_one("archive.max_id", &[], |row| row.get(0))?
        .unwrap_or(0);

    for id in 1..=max_id {
        if id == SINGLE_CONTAINER_ID {
            generate_single_container_hashes(catalog, layout, file_read_size)?;
            continue;
        }
        if let Some(path) = container_artifact_path(catalog, layout, id)? {
            let hashes = hash_file(&path, file_read_size)?;
            catalog.update(
                "archive.update_hashes_by_id",
                &[
                    &hex::encode(&hashes.blake2b),
                    &hex::encode(&hashes.sha3),
                    &(id as i64),
                ],
            )?;
        }
    }
    Ok(())
}

fn generate_single_container_hashes(catalog: &Catalog, layout: &ArchiveLayout, file_read_size: usize) -> Result<(), ArchiveError> {
    let revisions: Vec<(i64, String)> = catalog.query_many(
        "file.all_single_archive_revisions",
        &[],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    for (file_id, archive_time) in revisions {
        let revision_name = single_revision_name(file_id as u64, &archive_time);
        let artifact = layout.single_revision_artifact(&revision_name);
        if !artifact.exists() {
            continue;
        }
        let hashes = hash_file(&artifact, file_read_size)?;
        catalog.insert(
            "archive.replace_single_hash",
            &[
                &file_id,
                &archive_time,
                &hex::encode(&hashes.blake2b),
                &hex::encode(&hashes.sha3),
            ],
        )?;
    }
    Ok(())
}

/// Same traversal as `generate_all_container_hashes`, but compares against
/// the stored digest instead of overwriting it.
pub fn check_all_container_hashes(catalog: &Catalog, layout: &ArchiveLayout, file_read_size: usize) -> Result<(), ArchiveError> {
    let max_id: u64 = catalog
        .query_one("archive.max_id", &[], |row| row.get(0))?
        .unwrap_or(0);

    for id in 1..=max_id {
        if id == SINGLE_CONTAINER_ID {
            check_single_container_hashes(catalog, layout, file_read_size)?;
            continue;
        }
        let Some(path) = container_artifact_path(catalog, layout, id)? else {
            continue;
        };
        let stored: Option<(Option<String>, Option<String>)> = catalog.query_one(
            "archive.hashes_by_id",
            &[&(id as i64)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let Some((Some(stored_blake2b), Some(stored_sha3))) = stored else {
            continue;
        };
        let hashes = hash_file(&path, file_read_size)?;
        if hex::encode(&hashes.blake2b) != stored_blake2b || hex::encode(&hashes.sha3) != stored_sha3 {
            return Err(ArchiveError::ArchiveHashMismatch(id));
        }
    }
    Ok(())
}

fn check_single_container_hashes(catalog: &Catalog, layout: &ArchiveLayout, file_read_size: usize) -> Result<(), ArchiveError> {
    let stored: Vec<(i64, String, String, String)> = catalog.query_many(
        "archive.all_single_hashes",
        &[],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;

    for (file_id, archive_time, stored_blake2b, stored_sha3) in stored {
        let revision_name = single_revision_name(file_id as u64, &archive_time);
        let artifact = layout.single_revision_artifact(&revision_name);
        if !artifact.exists() {
            continue;
        }
        let hashes = hash_file(&artifact, file_read_size)?;
        if hex::encode(&hashes.blake2b) != stored_blake2b || hex::encode(&hashes.sha3) != stored_sha3 {
            return Err(ArchiveError::ArchiveHashMismatch(SINGLE_CONTAINER_ID));
        }
    }
    Ok(())
}

fn single_revision_name(file_id: u64, archive_time: &str) -> String {
    use crate::utils::format_revision_name;
    use chrono::{DateTime, Utc};
    let dt = DateTime::parse_from_rfc3339(archive_time)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    format_revision_name(file_id, dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::Clock;
    use crate::compressor::TarCompressor;
    use crate::config::Config;
    use crate::output::OutputCtx;
    use crate::pipeline::{self, RunOptions};
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn generate_then_check_round_trips_on_an_unmodified_artifact() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.bin"), b"container bytes").unwrap();

        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let cfg = Config::default();
        let opts = RunOptions { info_mode: false, ignore_audit: false };
        let out = OutputCtx::new(true, false, false);

        let (uow, _staged) = pipeline::walk_and_archive(
            &catalog, &compressor, &layout, &mut clock, &cfg, &root, Path::new(""), &opts, &out,
        )
        .unwrap();
        catalog.commit().unwrap();
        pipeline::compress_modified_archives(&catalog, &compressor, &layout, &uow).unwrap();
        catalog.commit().unwrap();

        generate_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap();
        check_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap();
    }

    #[test]
    fn check_all_container_hashes_detects_a_tampered_artifact() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.bin"), b"container bytes").unwrap();

        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let cfg = Config::default();
        let opts = RunOptions { info_mode: false, ignore_audit: false };
        let out = OutputCtx::new(true, false, false);

        let (uow, _staged) = pipeline::walk_and_archive(
            &catalog, &compressor, &layout, &mut clock, &cfg, &root, Path::new(""), &opts, &out,
        )
        .unwrap();
        catalog.commit().unwrap();
        pipeline::compress_modified_archives(&catalog, &compressor, &layout, &uow).unwrap();
        catalog.commit().unwrap();

        generate_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap();

        let container_id = uow.dirtied_containers().next().unwrap();
        let artifact = container_artifact_path(&catalog, &layout, container_id).unwrap().unwrap();
        let mut bytes = std::fs::read(&artifact).unwrap();
        bytes.push(0xff);
        std::fs::write(&artifact, bytes).unwrap();

        let err = check_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveHashMismatch(id) if id == container_id));
    }

    #[test]
    fn single_container_hashes_round_trip() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("huge.bin"), b"oversize content").unwrap();

        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let mut cfg = Config::default();
        cfg.archive.single_archive_size = 1;
        let opts = RunOptions { info_mode: false, ignore_audit: false };
        let out = OutputCtx::new(true, false, false);

        let (uow, _staged) = pipeline::walk_and_archive(
            &catalog, &compressor, &layout, &mut clock, &cfg, &root, Path::new(""), &opts, &out,
        )
        .unwrap();
        assert!(uow.single_dirtied().next().is_some());
        catalog.commit().unwrap();
        pipeline::compress_modified_archives(&catalog, &compressor, &layout, &uow).unwrap();
        catalog.commit().unwrap();

        generate_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap();
        check_all_container_hashes(&catalog, &layout, cfg.general.file_read_size as usize).unwrap();
    }
}

