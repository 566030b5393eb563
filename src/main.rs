//! favs - persistent, ordered favorites for files and folders

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = favorites::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
