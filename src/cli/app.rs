//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::favorites::{self, MoveTarget};
use super::output::{Output, OutputFormat};
use super::session::{Location, Session};
use super::watch_cmd;

#[derive(Parser)]
#[command(name = "favs")]
#[command(author, version, about = "Persistent, ordered favorites for files and folders")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub location: Location,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List favorites in display order
    List,

    /// Add files or folders as favorites
    ///
    /// Paths inside the workspace are added as workspace members, anything
    /// else as an external path. Re-adding a favorite refreshes it.
    Add {
        /// Paths to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove favorites
    Remove {
        /// Paths to remove
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Reorder favorites as one block
    ///
    /// Examples:
    ///   favs move a.txt c.txt --after b.txt
    ///   favs move a.txt --before b.txt
    ///   favs move a.txt              # to the end
    Move {
        /// Favorites to move, in the order they should end up
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        target: MoveTarget,
    },

    /// Set or clear the comment on a favorite
    Comment {
        /// Favorite to annotate
        path: PathBuf,

        /// Comment text (omit to clear)
        text: Option<String>,
    },

    /// Re-check which favorites still exist
    Check,

    /// Watch favorites and reconcile moves and deletions as they happen
    Watch {
        /// Milliseconds to gather events into one batch
        #[arg(long)]
        batch_millis: Option<u64>,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
pub fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(cli.format);

    tracing::debug!("favs starting");

    if let Commands::Config = cli.command {
        let config = cli.location.config()?;
        if output.is_json() {
            output.data(&config);
        } else {
            print!("{}", config.to_toml()?);
        }
        return Ok(());
    }

    let session = Session::open(&cli.location)?;

    let result = match &cli.command {
        Commands::List => favorites::list(&session, &output),
        Commands::Add { paths } => favorites::add(&session, &output, paths),
        Commands::Remove { paths } => favorites::remove(&session, &output, paths),
        Commands::Move { paths, target } => {
            favorites::move_entries(&session, &output, paths, target)
        }
        Commands::Comment { path, text } => {
            favorites::comment(&session, &output, path, text.as_deref())
        }
        Commands::Check => favorites::check(&session, &output),
        Commands::Watch {
            batch_millis,
            duration,
        } => watch_cmd::run(&session, &output, *batch_millis, *duration),
        Commands::Config => Ok(()),
    };

    session.close();

    tracing::debug!("Command completed");
    result
}
