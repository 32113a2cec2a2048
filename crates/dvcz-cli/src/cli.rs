use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dvcz_ledger::BuildVersion;
use dvcz_types::{DirStructure, HashAlgorithm};

#[derive(Parser)]
#[command(
    name = "dvcz",
    about = "Content-keyed stores, committers and build ledgers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (default: ~/.dvcz/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that every build in a project's ledger is in the store
    CheckBuilds(CheckBuildsArgs),
    /// Create, inspect and fill content-keyed stores
    Store(StoreArgs),
    /// Record builds in a project's ledger
    Ledger(LedgerArgs),
    /// Manage committers
    User(UserArgs),
}

#[derive(Args)]
pub struct CheckBuildsArgs {
    /// Project directory holding .dvcz/builds
    #[arg(short, long, default_value = ".")]
    pub project: PathBuf,
    /// Store root (default: store_root from the config)
    #[arg(short = 'u', long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub action: StoreAction,
}

#[derive(Subcommand)]
pub enum StoreAction {
    /// Create a store, or report the layout of an existing one
    Init {
        path: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        structure: Option<DirStructure>,
        #[arg(long)]
        algorithm: Option<HashAlgorithm>,
    },
    /// Show a store's layout and object count
    Info { path: Option<PathBuf> },
    /// Add files to a store
    Put {
        #[arg(short = 'u', long)]
        store: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub action: LedgerAction,
}

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Append a build record
    Append {
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
        /// Build version, MAJOR.MINOR.PATCH
        #[arg(long)]
        build_version: BuildVersion,
        /// Timestamp 'YYYY-MM-DD HH:MM:SS' (default: now, local time)
        #[arg(long)]
        timestamp: Option<String>,
        /// Digest of the build list
        digest: String,
    },
}

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a committer, its ID and its staging area in the store
    Add {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        login: String,
        #[arg(short = 'u', long)]
        store: Option<PathBuf>,
        /// Home directory holding .dvcz (default: the user's home)
        #[arg(long)]
        home: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_builds_defaults() {
        let cli = Cli::try_parse_from(["dvcz", "check-builds"]).unwrap();
        if let Command::CheckBuilds(args) = cli.command {
            assert_eq!(args.project, PathBuf::from("."));
            assert!(args.store.is_none());
        } else { panic!("wrong command"); }
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_check_builds_json() {
        let cli = Cli::try_parse_from([
            "dvcz", "check-builds", "-p", "proj", "-u", "/var/U", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::CheckBuilds(args) = cli.command {
            assert_eq!(args.project, PathBuf::from("proj"));
            assert_eq!(args.store, Some(PathBuf::from("/var/U")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_store_init() {
        let cli = Cli::try_parse_from([
            "dvcz", "store", "init", "/tmp/U", "--structure", "DIR16x16", "--algorithm", "sha3",
        ])
        .unwrap();
        if let Command::Store(StoreArgs { action: StoreAction::Init { path, structure, algorithm, name } }) = cli.command {
            assert_eq!(path, Some(PathBuf::from("/tmp/U")));
            assert_eq!(structure, Some(DirStructure::Dir16x16));
            assert_eq!(algorithm, Some(HashAlgorithm::Sha3));
            assert!(name.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_store_put_needs_files() {
        assert!(Cli::try_parse_from(["dvcz", "store", "put"]).is_err());
        let cli = Cli::try_parse_from(["dvcz", "store", "put", "a", "b"]).unwrap();
        if let Command::Store(StoreArgs { action: StoreAction::Put { files, .. } }) = cli.command {
            assert_eq!(files.len(), 2);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_ledger_append() {
        let cli = Cli::try_parse_from([
            "dvcz", "ledger", "append", "--build-version", "1.2.3", "abcd",
        ])
        .unwrap();
        if let Command::Ledger(LedgerArgs { action: LedgerAction::Append { build_version, digest, .. } }) = cli.command {
            assert_eq!(build_version, BuildVersion::new(1, 2, 3));
            assert_eq!(digest, "abcd");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn bad_version_is_rejected() {
        assert!(Cli::try_parse_from([
            "dvcz", "ledger", "append", "--build-version", "1.2", "abcd",
        ])
        .is_err());
    }

    #[test]
    fn parse_user_add() {
        let cli = Cli::try_parse_from([
            "dvcz", "user", "add", "--handle", "grinch", "--login", "jdd",
        ])
        .unwrap();
        if let Command::User(UserArgs { action: UserAction::Add { handle, login, store, home } }) = cli.command {
            assert_eq!(handle, "grinch");
            assert_eq!(login, "jdd");
            assert!(store.is_none() && home.is_none());
        } else { panic!("wrong command"); }
    }
}
