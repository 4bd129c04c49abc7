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
//! The revision engine: `archive_file` is the entry point driven by the
//! directory walk for every regular file under a user-supplied root.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::compressor::Compressor;
use crate::error::ArchiveError;
use crate::hashing::hash_file;
use crate::placement::{self, Archive, SINGLE_CONTAINER_ID};
use crate::staging;
use crate::unit_of_work::UnitOfWork;
use crate::utils::format_revision_name;
use std::path::{Path, PathBuf};

pub struct ArchiveLayout<'a> {
    pub archive_directory: &'a Path,
    pub temp_directory: &'a Path,
}

impl<'a> ArchiveLayout<'a> {
    pub fn container_full_path(&self, id: u64) -> PathBuf {
        self.archive_directory.join(format!("{id}.7z"))
    }
    pub fn container_part_path(&self, id: u64) -> PathBuf {
        self.archive_directory.join(format!("{id}_part.7z"))
    }
    pub fn container_old_part_path(&self, id: u64) -> PathBuf {
        self.archive_directory.join(format!("{id}_part_old.7z"))
    }
    pub fn single_revision_artifact(&self, revision_name: &str) -> PathBuf {
        self.archive_directory
            .join("1")
            .join(format!("{revision_name}.7z"))
    }
}

/// Outcome of archiving one file, used by the walk to decide whether to log
/// a dedup, a new revision, or an info-mode dry-run line.
pub enum ArchiveOutcome {
    Duplicate,
    NewRevision { container_id: u64, staged_path: PathBuf },
    InfoOnly { container_id: u64 },
}

/// Ingest one file: hash it, dedup-probe, place it into a container, and
/// (unless `info_mode`) stage its bytes and record the revision.
#[allow(clippy::too_many_arguments)]
pub fn archive_file(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    clock: &mut Clock,
    uow: &mut UnitOfWork,
    file_id: u64,
    absolute_path: &Path,
    relative_path: &Path,
    file_read_size: u64,
    target_size: u64,
    single_archive_size: u64,
    info_mode: bool,
) -> Result<ArchiveOutcome, ArchiveError> {
    let meta = std::fs::metadata(absolute_path).map_err(|source| ArchiveError::PathStat {
        path: absolute_path.to_path_buf(),
        source,
    })?;
    let size = meta.len();

    let hashes = hash_file(absolute_path, file_read_size as usize)?;
    let blake2b_hex = hex::encode(&hashes.blake2b);
    let sha3_hex = hex::encode(&hashes.sha3);

    let duplicate: Option<(i64, String)> = catalog.query_one(
        "file.revision_by_size_and_hashes",
        &[&(size as i64), &blake2b_hex.as_str(), &sha3_hex.as_str()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    if let Some((dup_file_id, dup_archive_time)) = duplicate {
        let archive_time = clock.next();
        catalog.insert(
            "file.insert_duplicate_revision",
            &[
                &(file_id as i64),
                &dup_file_id,
                &dup_archive_time,
                &archive_time.to_rfc3339(),
            ],
        )?;
        return Ok(ArchiveOutcome::Duplicate);
    }

    let archive = placement::placement_for(
        catalog,
        relative_path,
        size,
        target_size,
        single_archive_size,
    )?;

    if info_mode {
        return Ok(ArchiveOutcome::InfoOnly { container_id: archive.id });
    }

    load_existing_container(catalog, compressor, layout, &archive)?;

    let archive_time = clock.next();
    catalog.insert(
        "file.insert_new_revision",
        &[
            &(file_id as i64),
            &(size as i64),
            &(archive.id as i64),
            &blake2b_hex.as_str(),
            &sha3_hex.as_str(),
            &archive_time.to_rfc3339(),
        ],
    )?;

    let staged_path = staging::stage_file(
        layout.temp_directory,
        archive.id,
        file_id,
        archive_time,
        absolute_path,
    )?;

    uow.mark_container_dirty(archive.id);
    if archive.id == SINGLE_CONTAINER_ID {
        uow.mark_single_revision_dirty(format_revision_name(file_id, archive_time));
    }

    Ok(ArchiveOutcome::NewRevision { container_id: archive.id, staged_path })
}

/// Container 1 is loaded per-revision, never per-container (there is no
/// single compressed artifact for it), so this is a no-op for `<SINGLE>`.
/// For any other container, if a compressed artifact already exists on disk
/// and staging hasn't picked it up yet, extract it and verify the catalog's
/// recorded hash for the *compressed artifact* still matches the bytes on
/// disk before trusting it.
fn load_existing_container(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    archive: &Archive,
) -> Result<(), ArchiveError> {
    if archive.id == SINGLE_CONTAINER_ID {
        return Ok(());
    }

    let sealed = placement::is_sealed(catalog, archive)?;
    let artifact = if sealed {
        layout.container_full_path(archive.id)
    } else {
        layout.container_part_path(archive.id)
    };
    if !artifact.exists() {
        return Ok(());
    }

    let staging_dir = staging::container_staging_dir(layout.temp_directory, archive.id);
    let already_loaded = staging_dir.exists();

    staging::load_if_unloaded(compressor, &artifact, layout.temp_directory, archive.id)?;

    if already_loaded {
        return Ok(());
    }

    let stored: Option<(Option<String>, Option<String>)> = catalog.query_one(
        "archive.hashes_by_id",
        &[&(archive.id as i64)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    if let Some((Some(stored_blake2b), Some(stored_sha3))) = stored {
        if !staging::verify_loaded_hashes(&artifact, &stored_blake2b, &stored_sha3, 1 << 20)? {
            return Err(ArchiveError::ArchiveHashMismatch(archive.id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::compressor::TarCompressor;
    use tempfile::TempDir;

    #[test]
    fn identical_bytes_archived_twice_is_a_duplicate() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let mut uow = UnitOfWork::new();

        let src_a = temp.path().join("a.txt");
        std::fs::write(&src_a, b"hello world").unwrap();
        let outcome_a = archive_file(
            &catalog, &compressor, &layout, &mut clock, &mut uow,
            1, &src_a, Path::new("a.txt"), 1 << 16, 1 << 20, 1 << 30, false,
        )
        .unwrap();
        assert!(matches!(outcome_a, ArchiveOutcome::NewRevision { .. }));

        let src_b = temp.path().join("b.txt");
        std::fs::write(&src_b, b"hello world").unwrap();
        let outcome_b = archive_file(
            &catalog, &compressor, &layout, &mut clock, &mut uow,
            2, &src_b, Path::new("b.txt"), 1 << 16, 1 << 20, 1 << 30, false,
        )
        .unwrap();
        assert!(matches!(outcome_b, ArchiveOutcome::Duplicate));
    }

    #[test]
    fn new_revision_stages_the_exact_source_bytes() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let mut uow = UnitOfWork::new();

        let src = temp.path().join("a.txt");
        std::fs::write(&src, b"staged payload").unwrap();
        let outcome = archive_file(
            &catalog, &compressor, &layout, &mut clock, &mut uow,
            1, &src, Path::new("a.txt"), 1 << 16, 1 << 20, 1 << 30, false,
        )
        .unwrap();

        match outcome {
            ArchiveOutcome::NewRevision { staged_path, .. } => {
                assert!(staging::files_equal(&staged_path, &src).unwrap());
            }
            _ => panic!("expected a new revision"),
        }
    }

    #[test]
    fn load_existing_container_rejects_a_tampered_compressed_artifact() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let archive_dir = temp.path().join("archive");
        let temp_dir = temp.path().join("tmp");
        let layout = ArchiveLayout {
            archive_directory: &archive_dir,
            temp_directory: &temp_dir,
        };
        let mut clock = Clock::new();
        let mut uow = UnitOfWork::new();

        let src_a = temp.path().join("a.bin");
        std::fs::write(&src_a, b"payload-one").unwrap();
        let outcome = archive_file(
            &catalog, &compressor, &layout, &mut clock, &mut uow,
            1, &src_a, Path::new("a.bin"), 1 << 16, 1 << 30, 1 << 30, false,
        )
        .unwrap();
        let container_id = match outcome {
            ArchiveOutcome::NewRevision { container_id, .. } => container_id,
            _ => panic!("expected a new revision"),
        };

        // compress the staging directory as `compress_modified_archives` would.
        let staging_dir = staging::container_staging_dir(&temp_dir, container_id);
        let part = layout.container_part_path(container_id);
        compressor.compress(&staging_dir, &part).unwrap();

        // record a hash that does not match the artifact just written.
        catalog
            .update(
                "archive.update_hashes_by_id",
                &[&"0000", &"0000", &(container_id as i64)],
            )
            .unwrap();

        // drop the in-memory staging copy so the next call has to decompress
        // and re-verify the artifact instead of trusting what's cached.
        std::fs::remove_dir_all(&staging_dir).unwrap();

        let src_b = temp.path().join("b.bin");
        std::fs::write(&src_b, b"payload-two").unwrap();
        let err = archive_file(
            &catalog, &compressor, &layout, &mut clock, &mut uow,
            2, &src_b, Path::new("b.bin"), 1 << 16, 1 << 30, 1 << 30, false,
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveHashMismatch(id) if id == container_id));
    }
}
