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
//! Chooses or creates the archive container for a file, per the bin-packing
//! policy: route oversize files to the reserved `<SINGLE>` container, and
//! otherwise pack by content-class tag (lowercased extension, or `<BLANK>`
//! for extensionless files) against a per-container size budget.
//!
//! The source's `<BLANK>` branch computes a container but falls through into
//! the generic extension lookup without returning, silently discarding the
//! result. This implementation treats `<BLANK>` as an ordinary tag (it simply
//! *is* one of the values `content_class` can produce) so there is no special
//! branch to fall through in the first place.

use crate::catalog::Catalog;
use crate::error::ArchiveError;
use std::path::Path;

pub const SINGLE_CONTAINER_ID: u64 = 1;
pub const SINGLE_TAG: &str = "<SINGLE>";
pub const BLANK_TAG: &str = "<BLANK>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub id: u64,
    pub contents: String,
}

/// The content-class tag for a file: its lowercased extension, or `<BLANK>`
/// if it has none. Does not consider size — the `<SINGLE>` override is
/// applied by the caller, `placement_for`, before this is consulted.
pub fn content_class(path: &Path) -> String {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => BLANK_TAG.to_string(),
    }
}

pub fn current_container_id(catalog: &Catalog, tag: &str) -> Result<u64, ArchiveError> {
    let id: u64 = catalog
        .query_one("archive.current_id_for_contents", &[&tag], |row| row.get(0))?
        .unwrap_or(0);
    Ok(id)
}

fn container_size(catalog: &Catalog, id: u64) -> Result<u64, ArchiveError> {
    let size: i64 = catalog
        .query_one("archive.size_by_id", &[&(id as i64)], |row| row.get(0))?
        .unwrap_or(0);
    Ok(size as u64)
}

fn insert_container(catalog: &Catalog, tag: &str) -> Result<Archive, ArchiveError> {
    let id = catalog.insert("archive.insert", &[&tag])?;
    Ok(Archive {
        id,
        contents: tag.to_string(),
    })
}

/// Choose or create the archive container for a file of the given relative
/// path and byte size, against the configured `target_size` and
/// `single_archive_size` budgets.
pub fn placement_for(
    catalog: &Catalog,
    relative_path: &Path,
    size: u64,
    target_size: u64,
    single_archive_size: u64,
) -> Result<Archive, ArchiveError> {
    if size >= single_archive_size {
        return Ok(Archive {
            id: SINGLE_CONTAINER_ID,
            contents: SINGLE_TAG.to_string(),
        });
    }

    let tag = content_class(relative_path);
    let current_id = current_container_id(catalog, &tag)?;
    if current_id == 0 {
        return insert_container(catalog, &tag);
    }

    let fits = current_id == SINGLE_CONTAINER_ID
        || container_size(catalog, current_id)?.saturating_add(size) <= target_size;

    if fits {
        Ok(Archive {
            id: current_id,
            contents: tag,
        })
    } else {
        insert_container(catalog, &tag)
    }
}

/// A container is sealed once it is no longer the current container for its
/// tag — i.e. a later container with the same tag has since been created.
pub fn is_sealed(catalog: &Catalog, archive: &Archive) -> Result<bool, ArchiveError> {
    let current_id = current_container_id(catalog, &archive.contents)?;
    Ok(current_id != archive.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::path::Path;

    #[test]
    fn oversize_file_routes_to_single_regardless_of_extension() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a = placement_for(&catalog, Path::new("a.txt"), 10_000_000, 1_000_000, 5_000_000).unwrap();
        assert_eq!(a.id, SINGLE_CONTAINER_ID);
        assert_eq!(a.contents, SINGLE_TAG);
    }

    #[test]
    fn blank_tag_is_packed_like_any_other_tag() {
        let catalog = Catalog::open_in_memory().unwrap();
        let a = placement_for(&catalog, Path::new("noext"), 10, 1000, 5000).unwrap();
        assert_eq!(a.contents, BLANK_TAG);
        assert_ne!(a.id, SINGLE_CONTAINER_ID);
    }

    #[test]
    fn packing_seals_and_advances_container_id() {
        let catalog = Catalog::open_in_memory().unwrap();
        let target = 10u64;

        let first = placement_for(&catalog, Path::new("a.bin"), 6, target, 1_000_000).unwrap();
        catalog
            .insert(
                "file.insert_new_revision",
                &[
                    &1i64,
                    &6i64,
                    &(first.id as i64),
                    &"hb",
                    &"hs",
                    &"2026-01-01-00:00:00.000",
                ],
            )
            .unwrap();

        // second file of the same tag overflows the 10-byte budget (6 + 6 > 10).
        let second = placement_for(&catalog, Path::new("b.bin"), 6, target, 1_000_000).unwrap();
        assert_ne!(first.id, second.id);
        assert!(is_sealed(&catalog, &first).unwrap());
        assert!(!is_sealed(&catalog, &second).unwrap());
    }
}
