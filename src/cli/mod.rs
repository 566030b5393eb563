//! # Command-Line Interface
//!
//! A thin host for the favorites store: each command opens the store,
//! applies one operation, and saves on the way out.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `list` | Show favorites in display order |
//! | `add`, `remove` | Change the set of favorites |
//! | `move` | Reorder favorites as one block |
//! | `comment` | Annotate a favorite |
//! | `check` | Re-probe which favorites still exist |
//! | `watch` | Follow moves and deletions as they happen |
//! | `config` | Print the effective configuration |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` selects the
//! filter; without it `--verbose` enables debug output.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod favorites;
mod output;
mod session;
mod watch_cmd;

pub use app::{init_logging, run, Cli, Commands};
pub use output::{Output, OutputFormat};
pub use session::{Location, Session};
