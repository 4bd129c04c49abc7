//! Filesystem walker: enumerates a directory tree in deterministic order,
//! yielding directories and regular files relative to a root. Kept as a thin
//! wrapper over `walkdir` rather than a hand-rolled recursive reader, mirroring
//! how the source treats directory traversal as a utility the core pipeline
//! consumes rather than something it reimplements.

use crate::error::ArchiveError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub enum WalkEntry {
    Directory { relative_path: PathBuf },
    File { relative_path: PathBuf, size: u64 },
}

/// Walk `root`, yielding every directory and regular file under it (not
/// including `root` itself) with paths relative to `root`, sorted by name at
/// each level so that repeated runs observe files in the same order.
pub fn walk(root: &Path) -> Result<Vec<WalkEntry>, ArchiveError> {
    let mut out = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|e| ArchiveError::PathWalk {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_path_buf();

        if rel.as_os_str().is_empty() {
            continue;
        }

        let meta = entry.metadata().map_err(|e| ArchiveError::PathStat {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

        if meta.is_dir() {
            out.push(WalkEntry::Directory { relative_path: rel });
        } else if meta.is_file() {
            out.push(WalkEntry::File {
                relative_path: rel,
                size: meta.len(),
            });
        }
        // symlinks and other special files are not part of this system's data model.
    }

    Ok(out)
}
