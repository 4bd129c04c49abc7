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
mod audit;
mod catalog;
mod clock;
mod compressor;
mod config;
mod dearchive;
mod error;
mod hashing;
mod output;
mod path_tree;
mod pipeline;
mod placement;
mod revision;
mod scan;
mod staging;
mod unit_of_work;
mod utils;

use clap::Parser;
use clock::Clock;
use compressor::SevenZipCompressor;
use config::Config;
use output::OutputCtx;
use pipeline::RunOptions;
use revision::ArchiveLayout;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Content-addressed, deduplicating file archival engine with revision history.
#[derive(Parser, Debug)]
#[command(name = "custodian", about, version)]
struct Cli {
    /// Archive the positional paths.
    #[arg(long)]
    archive: bool,

    /// Dearchive the positional paths.
    #[arg(long)]
    dearchive: bool,

    /// Output root for dearchive.
    #[arg(long)]
    destination: Option<PathBuf>,

    /// Prefix stripped from each walked path to form catalog-relative paths.
    #[arg(long, default_value = "")]
    prefix: PathBuf,

    /// Configuration file path.
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,

    /// Verbose diagnostics.
    #[arg(long)]
    debug: bool,

    /// Dry-run: walk and log; never modify filesystem or catalog.
    #[arg(long)]
    info: bool,

    /// Skip read-back audits (dangerous).
    #[arg(long)]
    ignore: bool,

    /// Run the integrity check for every container id.
    #[arg(long = "check-archives")]
    check_archives: bool,

    /// Run the integrity hash generation for every container id.
    #[arg(long = "gen-archives")]
    gen_archives: bool,

    /// Mirror diagnostics to this file in addition to stderr.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Paths to archive or dearchive.
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = output::init_logging(cli.debug, cli.log_file.as_deref()) {
        eprintln!("error: could not initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let out = OutputCtx::new(false, cli.info, cli.debug);
    utils::print_banner();

    let cfg = Config::load(&cli.config)?;
    info!("{}", cfg.redacted_summary());

    let mut db = catalog::Catalog::open(&cfg.database.location)?;

    let layout = ArchiveLayout {
        archive_directory: &cfg.archive.archive_directory,
        temp_directory: &cfg.archive.temp_archive_directory,
    };
    let compressor = SevenZipCompressor::default();

    if cli.gen_archives {
        audit::generate_all_container_hashes(&db, &layout, cfg.general.file_read_size as usize)?;
        db.commit()?;
        out.println("generated integrity hashes for all containers");
        db.close();
        return Ok(());
    }

    if cli.check_archives {
        audit::check_all_container_hashes(&db, &layout, cfg.general.file_read_size as usize)?;
        out.println("all container hashes verified");
        db.close();
        return Ok(());
    }

    if cli.dearchive {
        let destination = cli
            .destination
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--dearchive requires --destination"))?;
        for path in &cli.paths {
            dearchive::dearchive(&db, &compressor, &layout, path, &destination)?;
            out.println(&format!("dearchived: {}", path.display()));
        }
        db.close();
        return Ok(());
    }

    if cli.archive {
        let opts = RunOptions {
            info_mode: cli.info,
            ignore_audit: cli.ignore,
        };
        let mut clock = Clock::new();

        let mut all_uow = unit_of_work::UnitOfWork::new();
        let mut all_staged_pairs = Vec::new();

        let run_result = (|| -> anyhow::Result<()> {
            for root in &cli.paths {
                let (uow, staged_pairs) = pipeline::walk_and_archive(
                    &db,
                    &compressor,
                    &layout,
                    &mut clock,
                    &cfg,
                    root,
                    &cli.prefix,
                    &opts,
                    &out,
                )?;
                for id in uow.dirtied_containers() {
                    all_uow.mark_container_dirty(id);
                }
                for name in uow.single_dirtied() {
                    all_uow.mark_single_revision_dirty(name.to_string());
                }
                all_staged_pairs.extend(staged_pairs);
            }
            Ok(())
        })();

        if let Err(e) = run_result {
            db.rollback()?;
            prompt_delete_staging(&cfg.archive.temp_archive_directory, &out);
            return Err(e);
        }

        if opts.info_mode {
            db.rollback()?;
            out.println("info mode: no changes committed");
            return Ok(());
        }

        db.commit()?;

        if let Err(e) = pipeline::compress_modified_archives(&db, &compressor, &layout, &all_uow) {
            prompt_delete_staging(&cfg.archive.temp_archive_directory, &out);
            return Err(e.into());
        }

        if let Err(e) = pipeline::update_dirtied_archive_hashes(
            &db,
            &layout,
            &all_uow,
            cfg.general.file_read_size as usize,
        ) {
            db.rollback()?;
            prompt_delete_staging(&cfg.archive.temp_archive_directory, &out);
            return Err(e.into());
        }

        // The hash-update transaction only commits after the staged bytes have
        // been verified against what's actually on disk — a `ReadbackMismatch`
        // must roll back the freshly-written archive hashes along with it, not
        // just fail after they are already durable.
        if let Err(e) = pipeline::walk_and_check(&all_staged_pairs) {
            db.rollback()?;
            prompt_delete_staging(&cfg.archive.temp_archive_directory, &out);
            return Err(e.into());
        }

        db.commit()?;

        if !opts.ignore_audit {
            pipeline::check_modified_archives(&compressor, &layout, &all_uow)?;
        }

        out.println("archive run complete");
        db.close();
        return Ok(());
    }

    anyhow::bail!("nothing to do: pass --archive, --dearchive, --check-archives, or --gen-archives")
}

/// On rollback, staged files under `<temp>` are orphaned. Prompt to delete
/// them interactively; a non-interactive invocation (no controlling
/// terminal) leaves them in place and logs the path instead.
fn prompt_delete_staging(temp_dir: &std::path::Path, out: &OutputCtx) {
    if !temp_dir.exists() {
        return;
    }
    if !atty_stdin() {
        out.eprintln(&format!(
            "staging files left at {} (non-interactive session)",
            temp_dir.display()
        ));
        return;
    }

    print!("delete orphaned staging files at {}? [y/N] ", temp_dir.display());
    output::flush_stdout();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_ok() && line.trim().eq_ignore_ascii_case("y") {
        let _ = std::fs::remove_dir_all(temp_dir);
        out.println("staging files deleted");
    }
}

fn atty_stdin() -> bool {
    use std::io::IsTerminal;
    io::stdin().is_terminal()
}
