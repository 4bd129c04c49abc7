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
//! Walks the catalog, locates a file's most recent revision, decompresses
//! the owning container, and copies the staged byte stream out.

use crate::catalog::Catalog;
use crate::compressor::Compressor;
use crate::error::ArchiveError;
use crate::path_tree;
use crate::placement::SINGLE_CONTAINER_ID;
use crate::revision::ArchiveLayout;
use crate::staging;
use crate::utils::format_revision_name;
use chrono::{DateTime, Utc};
use std::path::Path;

struct MostRecentRevision {
    file_id: u64,
    archive_time: DateTime<Utc>,
    archive_id: u64,
}

fn most_recent_revision(catalog: &Catalog, file_id: u64) -> Result<Option<MostRecentRevision>, ArchiveError> {
    let row: Option<(i64, String, i64)> = catalog.query_one(
        "file.most_recent_revision_info",
        &[&(file_id as i64), &(file_id as i64)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(row.map(|(file_id, archive_time, archive_id)| MostRecentRevision {
        file_id: file_id as u64,
        archive_time: DateTime::parse_from_rfc3339(&archive_time)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        archive_id: archive_id as u64,
    }))
}

/// Dearchive one catalog-tracked file to `<out_root>/<relative_path>`.
fn dearchive_file(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    file: &path_tree::File,
    out_path: &Path,
) -> Result<(), ArchiveError> {
    let revision = most_recent_revision(catalog, file.id)?
        .ok_or_else(|| ArchiveError::PathNotInAnyArchive(file.path.clone()))?;

    let revision_name = format_revision_name(revision.file_id, revision.archive_time);

    let staged_path = if revision.archive_id == SINGLE_CONTAINER_ID {
        let artifact = layout.single_revision_artifact(&revision_name);
        let staging_dir = staging::container_staging_dir(layout.temp_directory, SINGLE_CONTAINER_ID);
        let staged = staging_dir.join(&revision_name);
        if !staged.exists() {
            std::fs::create_dir_all(&staging_dir)?;
            compressor.decompress(&artifact, &staging_dir)?;
        }
        staged
    } else {
        let sealed_path = layout.container_full_path(revision.archive_id);
        let part_path = layout.container_part_path(revision.archive_id);
        let artifact = if sealed_path.exists() { sealed_path } else { part_path };
        staging::load_if_unloaded(compressor, &artifact, layout.temp_directory, revision.archive_id)?;
        staging::container_staging_dir(layout.temp_directory, revision.archive_id).join(&revision_name)
    };

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&staged_path, out_path)?;
    Ok(())
}

/// Dearchive `relative_path` (a file or directory, resolved against the
/// catalog) into `out_root`.
pub fn dearchive(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    relative_path: &Path,
    out_root: &Path,
) -> Result<(), ArchiveError> {
    let file = path_tree::resolve_file(catalog, relative_path)?;
    if file.id != 0 {
        let dest = out_root.join(relative_path);
        return dearchive_file(catalog, compressor, layout, &file, &dest);
    }

    let directory = path_tree::resolve_directory(catalog, relative_path)?;
    if directory.id != 0 {
        return dearchive_directory(catalog, compressor, layout, directory.id, relative_path, out_root);
    }

    Err(ArchiveError::PathNotInAnyArchive(relative_path.to_path_buf()))
}

fn dearchive_directory(
    catalog: &Catalog,
    compressor: &dyn Compressor,
    layout: &ArchiveLayout,
    directory_id: u64,
    relative_path: &Path,
    out_root: &Path,
) -> Result<(), ArchiveError> {
    std::fs::create_dir_all(out_root.join(relative_path))?;

    let files: Vec<(i64, String)> = catalog.query_many(
        "directory.child_files",
        &[&(directory_id as i64)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    for (id, name) in files {
        let file = path_tree::File {
            id: id as u64,
            parent_id: directory_id,
            path: relative_path.join(&name),
        };
        let dest = out_root.join(&file.path);
        dearchive_file(catalog, compressor, layout, &file, &dest)?;
    }

    let directories: Vec<(i64, String)> = catalog.query_many(
        "directory.child_directories",
        &[&(directory_id as i64)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    for (id, name) in directories {
        dearchive_directory(
            catalog,
            compressor,
            layout,
            id as u64,
            &relative_path.join(&name),
            out_root,
        )?;
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
    use crate::output::OutputCtx;
    use crate::pipeline::{self, RunOptions};
    use tempfile::TempDir;

    #[test]
    fn dearchive_reproduces_a_single_file() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("doc.txt"), b"archived content").unwrap();

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
        pipeline::update_dirtied_archive_hashes(&catalog, &layout, &uow, cfg.general.file_read_size as usize).unwrap();
        catalog.commit().unwrap();

        let dest = temp.path().join("out");
        dearchive(&catalog, &compressor, &layout, Path::new("doc.txt"), &dest).unwrap();

        let result = std::fs::read(dest.join("doc.txt")).unwrap();
        assert_eq!(result, b"archived content");
    }

    #[test]
    fn dearchive_reproduces_a_directory_tree() {
        let catalog = Catalog::open_in_memory().unwrap();
        let compressor = TarCompressor;
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("top.txt"), b"top-level").unwrap();
        std::fs::write(root.join("sub").join("nested.txt"), b"nested-file").unwrap();

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
        pipeline::update_dirtied_archive_hashes(&catalog, &layout, &uow, cfg.general.file_read_size as usize).unwrap();
        catalog.commit().unwrap();

        let dest = temp.path().join("out");
        dearchive(&catalog, &compressor, &layout, Path::new(""), &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("top.txt")).unwrap(), b"top-level");
        assert_eq!(
            std::fs::read(dest.join("sub").join("nested.txt")).unwrap(),
            b"nested-file"
        );
    }
}
