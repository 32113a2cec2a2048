use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime, Timelike};
use colored::Colorize;
use dvcz_identity::{Committer, CommitterIdFile, SystemClock};
use dvcz_ledger::{
    append_record, check_builds, BuildRecord, BuildVersion, Problem, VerificationReport,
    TIMESTAMP_FORMAT,
};
use dvcz_store::{default_name, Store, StoreConfig, DEFAULT_MODE};
use dvcz_types::{builds_path, HashAlgorithm};
use serde::Serialize;

use crate::cli::*;
use crate::config::Config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::CheckBuilds(args) => cmd_check_builds(&config, args, cli.format),
        Command::Store(args) => match args.action {
            StoreAction::Init { path, name, structure, algorithm } => {
                let requested = StoreConfig::new(
                    structure.unwrap_or(config.structure),
                    algorithm.unwrap_or(config.algorithm),
                );
                cmd_store_init(config.store_root(path)?, name, requested, cli.format)
            }
            StoreAction::Info { path } => {
                cmd_store_info(&config, &config.store_root(path)?, cli.format)
            }
            StoreAction::Put { store, files } => {
                cmd_store_put(&config, &config.store_root(store)?, &files)
            }
        },
        Command::Ledger(args) => match args.action {
            LedgerAction::Append { project, build_version, timestamp, digest } => {
                cmd_ledger_append(&project, build_version, timestamp.as_deref(), &digest)
            }
        },
        Command::User(args) => match args.action {
            UserAction::Add { handle, login, store, home } => {
                cmd_user_add(&config, &handle, &login, store, home)
            }
        },
    }
}

fn cmd_check_builds(config: &Config, args: CheckBuildsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store_root = config.store_root(args.store)?;
    let report = check_builds(&args.project, &store_root)
        .with_context(|| format!("cannot check builds of {}", args.project.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, &store_root),
    }
    if !report.is_clean() {
        bail!("{} of {} build record(s) failed", report.problems().count(), report.outcomes.len());
    }
    Ok(())
}

fn print_report(report: &VerificationReport, store_root: &Path) {
    println!("Checking {} against {} ({})", report.ledger.display(), store_root.display(), report.algorithm);
    for outcome in report.problems() {
        println!("\n{} line {}: {}", "✗".red().bold(), outcome.line_no, outcome.line.dimmed());
        if let Some(problem) = &outcome.problem {
            println!("  {}", problem.to_string().red());
            if let Problem::MissingFiles { files, .. } = problem {
                for file in files {
                    println!("    {} {}", file.digest.dimmed(), file.path.yellow());
                }
            }
        }
    }
    if report.cancelled {
        println!("\n{} Stopped early.", "!".yellow().bold());
    }
    let summary = format!("{} of {} build record(s) OK", report.passed_count(), report.outcomes.len());
    if report.is_clean() {
        println!("\n{} {}", "✓".green().bold(), summary);
    } else {
        println!("\n{}", summary.bold());
    }
}

#[derive(Serialize)]
struct StoreSummary {
    name: String,
    root: PathBuf,
    structure: String,
    algorithm: String,
    objects: usize,
}

impl StoreSummary {
    fn of(store: &Store) -> anyhow::Result<Self> {
        Ok(Self {
            name: store.name().to_string(),
            root: store.root().to_path_buf(),
            structure: store.structure().to_string(),
            algorithm: store.algorithm().to_string(),
            objects: store.digests()?.len(),
        })
    }

    fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(self)?),
            OutputFormat::Text => {
                println!("  Name:      {}", self.name.bold());
                println!("  Root:      {}", self.root.display());
                println!("  Structure: {}", self.structure.cyan());
                println!("  Algorithm: {}", self.algorithm.cyan());
                println!("  Objects:   {}", self.objects);
            }
        }
        Ok(())
    }
}

fn cmd_store_init(
    root: PathBuf,
    name: Option<String>,
    requested: StoreConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(|| default_name(&root));
    let store = Store::open_or_create(&name, &root, requested, DEFAULT_MODE)
        .with_context(|| format!("cannot initialize store at {}", root.display()))?;
    if format == OutputFormat::Text {
        println!("{} Store ready at {}", "✓".green().bold(), root.display().to_string().bold());
        if store.was_overridden() {
            println!(
                "  {} existing layout kept (requested {} / {})",
                "note:".yellow(),
                requested.structure,
                requested.algorithm
            );
        }
    }
    StoreSummary::of(&store)?.print(format)
}

fn cmd_store_info(config: &Config, root: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = Store::open_with(&default_name(root), root, config.store_config())
        .with_context(|| format!("cannot open store at {}", root.display()))?;
    StoreSummary::of(&store)?.print(format)
}

fn cmd_store_put(config: &Config, root: &Path, files: &[PathBuf]) -> anyhow::Result<()> {
    let store = Store::open_with(&default_name(root), root, config.store_config())
        .with_context(|| format!("cannot open store at {}", root.display()))?;
    for file in files {
        let data = fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
        let digest = store.put_data(&data)?;
        println!("{} {}", digest.yellow(), file.display());
    }
    Ok(())
}

fn cmd_ledger_append(
    project: &Path,
    version: BuildVersion,
    timestamp: Option<&str>,
    digest: &str,
) -> anyhow::Result<()> {
    let algorithm = HashAlgorithm::from_hex_len(digest.len())
        .with_context(|| format!("'{digest}' is not a 40 or 64 character digest"))?;
    algorithm.validate_digest(digest)?;
    let timestamp = match timestamp {
        Some(text) => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid timestamp '{text}'"))?,
        None => Local::now().naive_local(),
    };
    // Ledger timestamps have second precision.
    let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
    let record = BuildRecord::new(timestamp, version, digest);
    let ledger = builds_path(project);
    append_record(&ledger, &record)
        .with_context(|| format!("cannot append to {}", ledger.display()))?;
    println!("{} {}", "✓".green().bold(), record);
    Ok(())
}

fn cmd_user_add(
    config: &Config,
    handle: &str,
    login: &str,
    store: Option<PathBuf>,
    home: Option<PathBuf>,
) -> anyhow::Result<()> {
    let home = match home {
        Some(home) => home,
        None => dirs::home_dir().context("cannot find the home directory")?,
    };
    let root = config.store_root(store)?;
    let store = Store::open_with(&default_name(&root), &root, config.store_config())
        .with_context(|| format!("cannot open store at {}", root.display()))?;

    let committer = Committer::generate(handle, login, config.key_bits)?;
    let path = committer.write_to(&home)?;
    let id_file = CommitterIdFile::in_home(&home);
    let id = id_file.load_or_create(
        &committer.user().signing_key().public_part(),
        store.algorithm(),
        &SystemClock,
    )?;
    let staging = store
        .staging_store(&id)
        .with_context(|| format!("cannot create staging area for committer {id}"))?;

    println!("{} Added committer {}", "✓".green().bold(), handle.bold());
    println!("  Block:   {}", path.display());
    println!("  ID:      {}", id.yellow());
    println!("  Staging: {}", staging.root().display());
    Ok(())
}
