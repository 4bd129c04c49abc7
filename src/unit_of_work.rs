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
//! Replaces the source's process-wide mutable "dirtied containers" and
//! "single-dirtied" sets with a value threaded explicitly through the
//! ingestion call chain and drained once by the compression phase.

use std::collections::BTreeSet;

#[derive(Debug, Default, Clone)]
pub struct UnitOfWork {
    dirtied_containers: BTreeSet<u64>,
    single_dirtied: BTreeSet<String>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_container_dirty(&mut self, container_id: u64) {
        self.dirtied_containers.insert(container_id);
    }

    pub fn mark_single_revision_dirty(&mut self, revision_name: String) {
        self.single_dirtied.insert(revision_name);
    }

    pub fn dirtied_containers(&self) -> impl Iterator<Item = u64> + '_ {
        self.dirtied_containers.iter().copied()
    }

    pub fn single_dirtied(&self) -> impl Iterator<Item = &str> {
        self.single_dirtied.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.dirtied_containers.is_empty() && self.single_dirtied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_dirtied_containers_and_single_revisions() {
        let mut uow = UnitOfWork::new();
        assert!(uow.is_empty());
        uow.mark_container_dirty(2);
        uow.mark_container_dirty(2);
        uow.mark_single_revision_dirty("1_2026-01-01-00:00:00.000".to_string());
        assert_eq!(uow.dirtied_containers().collect::<Vec<_>>(), vec![2]);
        assert_eq!(uow.single_dirtied().collect::<Vec<_>>(), vec!["1_2026-01-01-00:00:00.000"]);
    }
}
