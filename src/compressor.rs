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
//! The external compressor is an opaque subprocess collaborator: "compress
//! directory D into file F", "decompress file F into directory D". This
//! module only needs to know those two operations, so it is expressed as a
//! small trait rather than baking a specific tool into every call site —
//! tests substitute `TarCompressor`, a deterministic store-only fake, instead
//! of shelling out.

use crate::error::ArchiveError;
use std::path::Path;
use std::process::Command;
use tracing::error;

pub trait Compressor {
    /// Compress every file under `src_dir` into a single solid archive at
    /// `out_path`.
    fn compress(&self, src_dir: &Path, out_path: &Path) -> Result<(), ArchiveError>;

    /// Extract every file from the artifact at `artifact` into `dest_dir`,
    /// recreating the original names and bytes.
    fn decompress(&self, artifact: &Path, dest_dir: &Path) -> Result<(), ArchiveError>;
}

/// Shells out to the `7z` command-line tool, matching the archive format the
/// source produces: solid LZMA2 at maximum compression.
pub struct SevenZipCompressor {
    pub binary: String,
}

impl Default for SevenZipCompressor {
    fn default() -> Self {
        Self {
            binary: "7z".to_string(),
        }
    }
}

impl Compressor for SevenZipCompressor {
    fn compress(&self, src_dir: &Path, out_path: &Path) -> Result<(), ArchiveError> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let glob = src_dir.join("*");
        let status = Command::new(&self.binary)
            .arg("a")
            .arg("-m0=LZMA2")
            .arg("-mx9")
            .arg("-myx=0")
            .arg("-ms=on")
            .arg("-mhc=on")
            .arg(out_path)
            .arg(glob)
            .status()
            .map_err(|e| {
                error!(binary = %self.binary, error = %e, "failed to spawn compressor");
                container_id_unknown_failure()
            })?;

        if !status.success() {
            error!(binary = %self.binary, ?status, out_path = %out_path.display(), "compressor exited with a non-zero status");
            return Err(container_id_unknown_failure());
        }
        Ok(())
    }

    fn decompress(&self, artifact: &Path, dest_dir: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest_dir)?;
        let status = Command::new(&self.binary)
            .arg("x")
            .arg("-y")
            .arg(format!("-o{}", dest_dir.display()))
            .arg(artifact)
            .status()
            .map_err(|e| {
                error!(binary = %self.binary, error = %e, "failed to spawn compressor");
                container_id_unknown_failure()
            })?;

        if !status.success() {
            error!(binary = %self.binary, ?status, artifact = %artifact.display(), "compressor exited with a non-zero status");
            return Err(container_id_unknown_failure());
        }
        Ok(())
    }
}

// `CompressorFailure` carries a container id in the core's error kind, but
// the trait boundary here has no notion of which container it was asked to
// compress; the underlying cause is logged above, and callers wrap this with
// the real id via `.map_err`.
fn container_id_unknown_failure() -> ArchiveError {
    ArchiveError::CompressorFailure(0)
}

/// A store-only, deterministic fake used by tests: wraps `tar` with no
/// compression so round-trips are cheap and exact.
pub struct TarCompressor;

impl Compressor for TarCompressor {
    fn compress(&self, src_dir: &Path, out_path: &Path) -> Result<(), ArchiveError> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(out_path)?;
        let mut builder = tar::Builder::new(file);
        builder.append_dir_all(".", src_dir)?;
        builder.finish()?;
        Ok(())
    }

    fn decompress(&self, artifact: &Path, dest_dir: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest_dir)?;
        let file = std::fs::File::open(artifact)?;
        let mut archive = tar::Archive::new(file);
        archive.unpack(dest_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tar_compressor_round_trips_bytes() {
        let src = tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();
        let out_dir = tempdir().unwrap();
        let artifact = out_dir.path().join("1.tar");

        let compressor = TarCompressor;
        compressor.compress(src.path(), &artifact).unwrap();

        let dest = tempdir().unwrap();
        compressor.decompress(&artifact, dest.path()).unwrap();

        let roundtrip = std::fs::read(dest.path().join("a.txt")).unwrap();
        assert_eq!(roundtrip, b"hello");
    }
}
