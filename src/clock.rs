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
//! `archive_time` must be a monotonically increasing, server-generated
//! timestamp. A plain `Utc::now()` call is not guaranteed to differ between
//! two insertions a few microseconds apart at millisecond resolution, so the
//! revision engine threads a small clock that bumps by one millisecond
//! whenever wall time has not advanced since the previous call.

use chrono::{DateTime, Duration, Utc};

pub struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn next(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_timestamps_strictly_increase() {
        let mut clock = Clock::new();
        let a = clock.next();
        let b = clock.next();
        let c = clock.next();
        assert!(a < b);
        assert!(b < c);
    }
}
