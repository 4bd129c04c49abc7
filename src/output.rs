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
//! Terminal-facing output, distinct from the structured `tracing` diagnostics
//! set up in `main`. This channel is for the person running the command;
//! `tracing` is for whoever later reads the log file.

use std::io::Write;

/// Shared output context passed through the pipeline and CLI commands.
#[derive(Clone, Copy)]
pub struct OutputCtx {
    pub quiet: bool,
    pub dry_run: bool,
    pub debug: bool,
}

impl OutputCtx {
    pub fn new(quiet: bool, dry_run: bool, debug: bool) -> Self {
        Self {
            quiet,
            dry_run,
            debug,
        }
    }

    /// Print a line to stdout unless `--quiet` was given.
    pub fn println(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    /// Print a line to stdout only when `--debug` was given.
    pub fn debugln(&self, line: &str) {
        if self.debug && !self.quiet {
            println!("{line}");
        }
    }

    /// Always print to stderr.
    pub fn eprintln(&self, line: &str) {
        eprintln!("{line}");
    }

    /// Print a "dry-run would do X" message.
    pub fn dry(&self, line: &str) {
        if !self.quiet {
            println!("[dry-run] {line}");
        }
    }
}

/// Initialize the `tracing` subscriber. `debug` raises the default filter
/// from `info` to `debug`; `RUST_LOG` always takes precedence if set.
/// `log_file`, when given, additionally mirrors formatted (non-ANSI) events
/// to that file.
pub fn init_logging(debug: bool, log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_target(false).with_ansi(true);

    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(std::sync::Mutex::new(file));
        registry.with(file_layer).init();
    } else {
        registry.init();
    }

    Ok(())
}

/// Flush stdout; used before interactive prompts so the prompt text is
/// visible before blocking on stdin.
pub fn flush_stdout() {
    let _ = std::io::stdout().flush();
}
