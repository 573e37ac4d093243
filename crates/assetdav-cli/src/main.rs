//! `assetdav`: browse and edit an asset store from the shell.
//!
//! Usage:
//!   assetdav init
//!   assetdav --user amy ls /photos
//!   assetdav put ./cat.jpg /photos/cat.jpg
//!   assetdav mv /photos/cat.jpg /archive/cat.jpg
//!
//! Without `--user` commands run as the system principal, which passes every
//! permission check. Mutating commands write the store back afterwards.

mod commands;
mod config;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use assetdav_kernel::{DavContext, MemoryRepository, StagingArea};
use assetdav_types::Principal;

use config::Config;

/// Filesystem view over an asset store.
#[derive(Parser, Debug)]
#[command(name = "assetdav")]
#[command(about = "Browse and edit an asset store as a filesystem")]
struct Args {
    /// Config file (default: ~/.config/assetdav/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store snapshot file, overriding the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Act as this configured principal
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty store
    Init {
        /// Overwrite an existing store
        #[arg(long)]
        force: bool,
    },
    /// List a folder
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Show kind, size and mtime
        #[arg(short, long)]
        long: bool,
    },
    /// Show asset metadata
    Stat { path: String },
    /// Print file content
    Cat { path: String },
    /// Upload a local file (`-` for stdin)
    Put { local: PathBuf, remote: String },
    /// Create a folder
    Mkdir { path: String },
    /// Delete a file or folder (recursively)
    Rm { path: String },
    /// Move or rename
    Mv { src: String, dest: String },
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Put { .. } | Command::Mkdir { .. } | Command::Rm { .. } | Command::Mv { .. }
        )
    }
}

fn open_store(path: &Path) -> Result<MemoryRepository> {
    if !path.exists() {
        bail!(
            "no store at {}; run `assetdav init` first",
            path.display()
        );
    }
    MemoryRepository::load(path).with_context(|| format!("loading store {}", path.display()))
}

fn init_store(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    MemoryRepository::new()
        .persist(path)
        .with_context(|| format!("writing store {}", path.display()))?;
    tracing::info!(store = %path.display(), "initialised store");
    println!("initialised {}", path.display());
    Ok(())
}

fn open_local(local: &Path) -> Result<Box<dyn Read>> {
    if local == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(local).with_context(|| format!("opening {}", local.display()))?;
    Ok(Box::new(file))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if let Err(e) = assetdav_telemetry::init(&config.log_filter) {
        eprintln!("assetdav: logging disabled: {e}");
    }

    let store = args.store.clone().unwrap_or_else(|| config.store_path());
    if let Command::Init { force } = args.command {
        return init_store(&store, force);
    }

    let repo = Arc::new(open_store(&store)?);
    config.apply(&repo);

    let principal = match &args.user {
        Some(username) => config.principal(username),
        None => Principal::system(),
    };
    tracing::debug!(principal = %principal, store = %store.display(), "session opened");

    let staging = config
        .staging_dir
        .clone()
        .map(StagingArea::new)
        .unwrap_or_default();
    let ctx = DavContext::with_staging(repo.clone(), principal, staging);

    let mut stdout = io::stdout().lock();
    match &args.command {
        Command::Init { .. } => unreachable!("handled above"),
        Command::Ls { path, long } => commands::ls(&ctx, path, *long, &mut stdout)?,
        Command::Stat { path } => commands::stat(&ctx, path, &mut stdout)?,
        Command::Cat { path } => commands::cat(&ctx, path, &mut stdout)?,
        Command::Put { local, remote } => {
            let mut input = open_local(local)?;
            commands::put(&ctx, remote, &mut input)?;
        }
        Command::Mkdir { path } => commands::mkdir(&ctx, path)?,
        Command::Rm { path } => commands::rm(&ctx, path)?,
        Command::Mv { src, dest } => commands::mv(&ctx, src, dest)?,
    }

    if args.command.mutates() {
        repo.persist(&store)
            .with_context(|| format!("writing store {}", store.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["assetdav", "--user", "amy", "ls", "-l", "/docs"]);
        assert_eq!(args.user.as_deref(), Some("amy"));
        assert!(matches!(args.command, Command::Ls { ref path, long: true } if path == "/docs"));
        assert!(!args.command.mutates());

        let args = Args::parse_from(["assetdav", "mv", "/a", "/b", "--store", "s.json"]);
        assert_eq!(args.store, Some(PathBuf::from("s.json")));
        assert!(args.command.mutates());
    }

    #[test]
    fn test_init_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("nested").join("store.json");
        assert!(open_store(&store).is_err());
        init_store(&store, false).unwrap();
        assert!(init_store(&store, false).is_err());
        init_store(&store, true).unwrap();
        let repo = open_store(&store).unwrap();
        assert_eq!(repo.len(), 1);
    }
}
