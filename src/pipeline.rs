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
//! Top-level orchestration: the directory walk that drives ingestion, the
//! two-phase compression and verification of dirtied containers, and the
//! modified-archive audit that follows it.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::compressor::Compressor;
use crate::config::Config;
use crate::error::ArchiveError;
use crate::output::OutputCtx;
use crate::path_tree;
use crate::placement::SINGLE_CONTAINER_ID;
use crate::revision::{self, ArchiveLayout, ArchiveOutcome};
use crate::scan::{self, WalkEntry};
use crate::staging;
use crate::unit_of_work::UnitOfWork;
use std::path::{Path, PathBuf};

pub struct RunOptions {
    pub info_mode: bool,
    pub ignore_audit: bool,
}

/// Drive `archive_file` over every regular file and `ensure_directory` over
/// every directory under `root`, after stripping `prefix`. Returns the
/// `UnitOfWork` of dirtied containers and the set of (staged_path,
/// absolute_path) pairs for the walk-and-check phase.
pub fn walk_and_archive(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    clock: &mut Clock,
    cfg: &Config,
    root: &Path,
    prefix: &Path,
    opts: &RunOptions,
    out: &OutputCtx,
) -> Result<(UnitOfWork, Vec<(u64, PathBuf, PathBuf)>), ArchiveError> {
    let mut uow = UnitOfWork::new();
    let mut staged_pairs = Vec::new();

    for entry in scan::walk(root)? {
        match entry {
            WalkEntry::Directory { relative_path } => {
                let catalog_path = strip_prefix(&relative_path, prefix);
                let dir = path_tree::resolve_directory(catalog, &catalog_path)?;
                path_tree::ensure_directory(catalog, &dir)?;
                out.debugln(&format!("DIRECTORY : {}", catalog_path.display()));
            }
            WalkEntry::File { relative_path, size } => {
                let absolute_path = root.join(&relative_path);
                let catalog_path = strip_prefix(&relative_path, prefix);

                let resolved = path_tree::resolve_file(catalog, &catalog_path)?;
                let file = path_tree::ensure_file(catalog, &resolved)?;

                out.debugln(&format!("FILE : {}", catalog_path.display()));

                let outcome = revision::archive_file(
                    catalog,
                    compressor,
                    layout,
                    clock,
                    &mut uow,
                    file.id,
                    &absolute_path,
                    &catalog_path,
                    cfg.general.file_read_size,
                    cfg.archive.target_size,
                    cfg.archive.single_archive_size,
                    opts.info_mode,
                )?;

                match outcome {
                    ArchiveOutcome::Duplicate => out.println(&format!(
                        "dedup: {} ({})",
                        catalog_path.display(),
                        crate::utils::human(size)
                    )),
                    ArchiveOutcome::NewRevision { container_id, staged_path } => {
                        out.println(&format!(
                            "archived: {} ({}) -> container {}",
                            catalog_path.display(),
                            crate::utils::human(size),
                            container_id
                        ));
                        staged_pairs.push((container_id, staged_path, absolute_path));
                    }
                    ArchiveOutcome::InfoOnly { container_id } => {
                        out.dry(&format!(
                            "archive: {} ({}) -> container {}",
                            catalog_path.display(),
                            crate::utils::human(size),
                            container_id
                        ));
                    }
                }
            }
        }
    }

    Ok((uow, staged_pairs))
}

fn strip_prefix(path: &Path, prefix: &Path) -> PathBuf {
    path.strip_prefix(prefix).unwrap_or(path).to_path_buf()
}

/// Compress every dirtied container per §4.6: container 1 per revision,
/// others into `_part.7z` or `<id>.7z` depending on whether they are sealed,
/// retiring the previous part to `_part_old.7z` first.
pub fn compress_modified_archives(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    uow: &UnitOfWork,
) -> Result<(), ArchiveError> {
    for revision_name in uow.single_dirtied() {
        let staged = staging::container_staging_dir(layout.temp_directory, SINGLE_CONTAINER_ID)
            .join(revision_name);
        let out_path = layout.single_revision_artifact(revision_name);
        let single_staging_dir = tempfile_sibling(&staged)?;
        std::fs::create_dir_all(&single_staging_dir)?;
        let linked = single_staging_dir.join(revision_name);
        std::fs::copy(&staged, &linked)?;
        compressor
            .compress(&single_staging_dir, &out_path)
            .map_err(|_| ArchiveError::CompressorFailure(SINGLE_CONTAINER_ID))?;
        let _ = std::fs::remove_dir_all(&single_staging_dir);
    }

    for container_id in uow.dirtied_containers() {
        if container_id == SINGLE_CONTAINER_ID {
            continue;
        }

        let full = layout.container_full_path(container_id);
        let part = layout.container_part_path(container_id);
        let old = layout.container_old_part_path(container_id);

        if part.exists() {
            std::fs::rename(&part, &old)?;
        }

        let contents: Option<String> = catalog.query_one(
            "archive.contents_by_id",
            &[&(container_id as i64)],
            |row| row.get(0),
        )?;
        let sealed = contents
            .map(|tag| crate::placement::current_container_id(catalog, &tag))
            .transpose()?
            .map(|current| current != container_id)
            .unwrap_or(false);

        let out_path = if sealed { &full } else { &part };
        let staging_dir = staging::container_staging_dir(layout.temp_directory, container_id);

        compressor
            .compress(&staging_dir, out_path)
            .map_err(|_| ArchiveError::CompressorFailure(container_id))?;
    }

    Ok(())
}

fn tempfile_sibling(path: &Path) -> Result<PathBuf, ArchiveError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!(
        "{}.stage",
        path.file_name().unwrap_or_default().to_string_lossy()
    )))
}

/// Update the catalog's recorded hashes for every dirtied container (§4.6,
/// post-compression phase).
pub fn update_dirtied_archive_hashes(
    catalog: &Catalog,
    layout: &ArchiveLayout,
    uow: &UnitOfWork,
    file_read_size: usize,
) -> Result<(), ArchiveError> {
    for revision_name in uow.single_dirtied() {
        let artifact = layout.single_revision_artifact(revision_name);
        let hashes = crate::hashing::hash_file(&artifact, file_read_size)?;
        if let Some((file_id, archive_time)) = crate::utils::parse_revision_name(revision_name) {
            catalog.insert(
                "archive.replace_single_hash",
                &[
                    &(file_id as i64),
                    &archive_time.to_rfc3339(),
                    &hex::encode(&hashes.blake2b),
                    &hex::encode(&hashes.sha3),
                ],
            )?;
        }
    }

    for container_id in uow.dirtied_containers() {
        if container_id == SINGLE_CONTAINER_ID {
            continue;
        }
        let full = layout.container_full_path(container_id);
        let part = layout.container_part_path(container_id);
        let artifact = if full.exists() { full } else { part };
        let hashes = crate::hashing::hash_file(&artifact, file_read_size)?;
        catalog.update(
            "archive.update_hashes_by_id",
            &[
                &hex::encode(&hashes.blake2b),
                &hex::encode(&hashes.sha3),
                &(container_id as i64),
            ],
        )?;
    }

    Ok(())
}

/// Verify every archived file on disk still equals the byte stream it was
/// staged from. Any mismatch is fatal per §7.
pub fn walk_and_check(staged_pairs: &[(u64, PathBuf, PathBuf)]) -> Result<(), ArchiveError> {
    for (container_id, staged_path, absolute_path) in staged_pairs {
        if !staging::files_equal(staged_path, absolute_path)? {
            return Err(ArchiveError::ReadbackMismatch {
                id: *container_id,
                name: absolute_path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Decompress each newly-written artifact and byte-compare it against
/// staging; if a `_part_old.7z` tombstone exists, compare it too and delete
/// it on success. Skipped entirely when `ignore` is set.
pub fn check_modified_archives(
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    uow: &UnitOfWork,
) -> Result<(), ArchiveError> {
    for revision_name in uow.single_dirtied() {
        let artifact = layout.single_revision_artifact(revision_name);
        let staged = staging::container_staging_dir(layout.temp_directory, SINGLE_CONTAINER_ID)
            .join(revision_name);
        let scratch = layout.temp_directory.join("new").join("1");
        compressor.decompress(&artifact, &scratch)?;
        let extracted = scratch.join(revision_name);
        if !staging::files_equal(&staged, &extracted)? {
            return Err(ArchiveError::ReadbackMismatch {
                id: SINGLE_CONTAINER_ID,
                name: revision_name.to_string(),
            });
        }
        let _ = std::fs::remove_dir_all(&scratch);
    }

    for container_id in uow.dirtied_containers() {
        if container_id == SINGLE_CONTAINER_ID {
            continue;
        }

        let artifact_full = layout.container_full_path(container_id);
        let artifact_part = layout.container_part_path(container_id);
        let artifact = if artifact_full.exists() { &artifact_full } else { &artifact_part };

        let new_scratch = layout.temp_directory.join("new").join(container_id.to_string());
        compressor.decompress(artifact, &new_scratch)?;
        compare_directories(
            &staging::container_staging_dir(layout.temp_directory, container_id),
            &new_scratch,
            container_id,
        )?;
        let _ = std::fs::remove_dir_all(&new_scratch);

        let old_part = layout.container_old_part_path(container_id);
        if old_part.exists() {
            let old_scratch = layout.temp_directory.join("old").join(container_id.to_string());
            compressor.decompress(&old_part, &old_scratch)?;
            compare_directories(
                &staging::container_staging_dir(layout.temp_directory, container_id),
                &old_scratch,
                container_id,
            )?;
            let _ = std::fs::remove_dir_all(&old_scratch);
            std::fs::remove_file(&old_part)?;
        }
    }

    Ok(())
}

/// Byte-compare every file present in `reference` against the same name in
/// `candidate`. Files only present in `candidate` (e.g. a prior part's now-
/// stale revisions) are not considered a mismatch.
fn compare_directories(reference: &Path, candidate: &Path, container_id: u64) -> Result<(), ArchiveError> {
    if !reference.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(reference)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let candidate_path = candidate.join(&name);
        if !candidate_path.exists() {
            continue;
        }
        if !staging::files_equal(&entry.path(), &candidate_path)? {
            return Err(ArchiveError::ReadbackMismatch {
                id: container_id,
                name: name.to_string_lossy().into_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::Clock;
    use crate::compressor::TarCompressor;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn walk_archive_compress_and_check_round_trip_two_files() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.bin"), b"alpha-bytes").unwrap();
        std::fs::write(root.join("b.bin"), b"beta-bytes-longer").unwrap();

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

        let (uow, staged_pairs) = walk_and_archive(
            &catalog, &compressor, &layout, &mut clock, &cfg, &root, Path::new(""), &opts, &out,
        )
        .unwrap();
        assert_eq!(staged_pairs.len(), 2);
        catalog.commit().unwrap();

        compress_modified_archives(&catalog, &compressor, &layout, &uow).unwrap();
        update_dirtied_archive_hashes(&catalog, &layout, &uow, cfg.general.file_read_size as usize).unwrap();
        walk_and_check(&staged_pairs).unwrap();
        catalog.commit().unwrap();

        check_modified_archives(&compressor, &layout, &uow).unwrap();
    }

    #[test]
    fn readback_mismatch_is_fully_rolled_back() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("f.txt"), b"original bytes").unwrap();

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

        let (_uow, staged_pairs) = walk_and_archive(
            &catalog, &compressor, &layout, &mut clock, &cfg, &root, Path::new(""), &opts, &out,
        )
        .unwrap();
        assert_eq!(staged_pairs.len(), 1);

        // the source file changes underfoot between staging and read-back.
        std::fs::write(root.join("f.txt"), b"tampered bytes!!").unwrap();

        let result = walk_and_check(&staged_pairs);
        assert!(matches!(result, Err(ArchiveError::ReadbackMismatch { .. })));

        catalog.rollback().unwrap();

        // the freshly-inserted container is rolled back along with the
        // revision row, leaving only the seeded `<SINGLE>` container.
        let max_id: u64 = catalog
            .query_one("archive.max_id", &[], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(max_id, 1);
    }
}
