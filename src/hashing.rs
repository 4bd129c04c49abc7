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
//! Streams a reader through two cryptographic hashes simultaneously:
//! BLAKE2b-512 and SHA3-512. Both are driven off the same read buffer so the
//! file is only read once; the caller must `seek(0)` before reusing a stream.

use crate::error::ArchiveError;
use blake2::Blake2b512;
use digest::Digest;
use sha3::Sha3_512;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHashes {
    pub blake2b: Vec<u8>,
    pub sha3: Vec<u8>,
}

/// Read `reader` to completion through both hashers using a buffer of
/// `buffer_size` bytes, returning both digests. Does not rewind the stream.
pub fn hash_stream(
    mut reader: impl Read,
    buffer_size: usize,
) -> std::io::Result<FileHashes> {
    let mut blake2b = Blake2b512::new();
    let mut sha3 = Sha3_512::new();
    let mut buf = vec![0u8; buffer_size.max(4096)];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        blake2b.update(&buf[..n]);
        sha3.update(&buf[..n]);
    }

    Ok(FileHashes {
        blake2b: blake2b.finalize().to_vec(),
        sha3: sha3.finalize().to_vec(),
    })
}

/// Convenience wrapper for hashing a file on disk.
pub fn hash_file(path: &Path, buffer_size: usize) -> Result<FileHashes, ArchiveError> {
    let file = std::fs::File::open(path).map_err(|source| ArchiveError::PathOpen {
        path: path.to_path_buf(),
        source,
    })?;
    hash_stream(file, buffer_size).map_err(|source| ArchiveError::HashIo {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn same_bytes_hash_identically() {
        let a = hash_stream(Cursor::new(b"hello world"), 4096).unwrap();
        let b = hash_stream(Cursor::new(b"hello world"), 4096).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_hash_differently() {
        let a = hash_stream(Cursor::new(b"hello world"), 4096).unwrap();
        let b = hash_stream(Cursor::new(b"hello there"), 4096).unwrap();
        assert_ne!(a.blake2b, b.blake2b);
        assert_ne!(a.sha3, b.sha3);
    }

    #[test]
    fn blake2b_and_sha3_digests_are_distinct() {
        let h = hash_stream(Cursor::new(b"distinguishable"), 4096).unwrap();
        assert_ne!(h.blake2b, h.sha3);
        assert_eq!(h.blake2b.len(), 64);
        assert_eq!(h.sha3.len(), 64);
    }
}
