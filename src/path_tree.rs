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
//! Resolves and materializes catalog rows (directories, files) for a
//! filesystem path. `id == 0` is the sentinel for "not yet in the catalog",
//! mirroring the source's convention rather than wrapping every lookup in
//! `Option`.

use crate::catalog::Catalog;
use crate::error::ArchiveError;
use std::path::{Component, Path, PathBuf};

pub const ROOT_DIRECTORY_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub id: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: u64,
    pub parent_id: u64,
    pub path: PathBuf,
}

fn components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Walk `relative_path` from the root, resolving each `(parent_id, name)` via
/// the catalog. Returns a directory with `id == 0` at the first absent
/// component. An empty path resolves to the root.
pub fn resolve_directory(catalog: &Catalog, relative_path: &Path) -> Result<Directory, ArchiveError> {
    let parts = components(relative_path);
    if parts.is_empty() {
        return Ok(Directory {
            id: ROOT_DIRECTORY_ID,
            path: PathBuf::from("/"),
        });
    }

    let mut parent_id = ROOT_DIRECTORY_ID;
    for name in &parts {
        let id: Option<i64> = catalog.query_one(
            "directory.by_name_and_parent",
            &[&name.as_str(), &(parent_id as i64)],
            |row| row.get(0),
        )?;
        match id {
            Some(id) => parent_id = id as u64,
            None => {
                return Ok(Directory {
                    id: 0,
                    path: relative_path.to_path_buf(),
                })
            }
        }
    }

    Ok(Directory {
        id: parent_id,
        path: relative_path.to_path_buf(),
    })
}

/// Resolve a file by its parent directory and basename. `id == 0` if absent
/// (including when the parent directory itself is absent).
pub fn resolve_file(catalog: &Catalog, relative_path: &Path) -> Result<File, ArchiveError> {
    let parent_path = relative_path.parent().unwrap_or(Path::new(""));
    let parent = resolve_directory(catalog, parent_path)?;
    let name = relative_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if parent.id == 0 {
        return Ok(File {
            id: 0,
            parent_id: 0,
            path: relative_path.to_path_buf(),
        });
    }

    let id: Option<i64> = catalog.query_one(
        "file.by_name_and_parent",
        &[&name.as_str(), &(parent.id as i64)],
        |row| row.get(0),
    )?;

    Ok(File {
        id: id.map(|v| v as u64).unwrap_or(0),
        parent_id: parent.id,
        path: relative_path.to_path_buf(),
    })
}

/// Recursively ensure `directory` and every ancestor exists in the catalog,
/// inserting rows as needed and returning the materialized directory (its
/// `id` now non-zero). Root is materialized to id 1 without insertion.
pub fn ensure_directory(catalog: &Catalog, directory: &Directory) -> Result<Directory, ArchiveError> {
    if directory.id != 0 {
        return Ok(directory.clone());
    }
    if directory.path.as_os_str().is_empty() || directory.path == Path::new("/") {
        return Ok(Directory {
            id: ROOT_DIRECTORY_ID,
            path: PathBuf::from("/"),
        });
    }

    let parent_path = directory.path.parent().unwrap_or(Path::new(""));
    let parent = resolve_directory(catalog, parent_path)?;
    let parent = ensure_directory(catalog, &parent)?;

    let name = directory
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let id = catalog.insert("directory.insert", &[&name.as_str(), &(parent.id as i64)])?;

    Ok(Directory {
        id,
        path: directory.path.clone(),
    })
}

/// Insert a file row if `file.id == 0`, returning the materialized file.
pub fn ensure_file(catalog: &Catalog, file: &File) -> Result<File, ArchiveError> {
    if file.id != 0 {
        return Ok(file.clone());
    }
    let name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = catalog.insert("file.insert", &[&name.as_str(), &(file.parent_id as i64)])?;
    Ok(File {
        id,
        parent_id: file.parent_id,
        path: file.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn resolve_missing_directory_returns_zero_id() {
        let catalog = Catalog::open_in_memory().unwrap();
        let dir = resolve_directory(&catalog, Path::new("a/b")).unwrap();
        assert_eq!(dir.id, 0);
    }

    #[test]
    fn ensure_directory_creates_ancestors() {
        let catalog = Catalog::open_in_memory().unwrap();
        let unresolved = resolve_directory(&catalog, Path::new("a/b/c")).unwrap();
        let materialized = ensure_directory(&catalog, &unresolved).unwrap();
        assert_ne!(materialized.id, 0);

        let resolved_again = resolve_directory(&catalog, Path::new("a/b/c")).unwrap();
        assert_eq!(resolved_again.id, materialized.id);
    }

    #[test]
    fn same_name_under_different_parents_are_distinct() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a = ensure_directory(&catalog, &resolve_directory(&catalog, Path::new("a/x")).unwrap()).unwrap();
        let b = ensure_directory(&catalog, &resolve_directory(&catalog, Path::new("b/x")).unwrap()).unwrap();
        assert_ne!(a.id, b.id);
    }
}
