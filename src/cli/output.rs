//! Output formatting for CLI commands

use serde::Serialize;

use crate::domain::Entry;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints a warning that does not fail the command
    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Warning: {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "warning": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize + ?Sized>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints favorites as a table, or as a JSON array
    pub fn entries(&self, entries: &[Entry]) {
        if self.is_json() {
            self.data(entries);
            return;
        }

        if entries.is_empty() {
            println!("No favorites");
            return;
        }

        println!("{:<4} {:<8} {:<24} PATH", "#", "STATUS", "LABEL");
        println!("{}", "-".repeat(72));
        for (index, entry) in entries.iter().enumerate() {
            println!(
                "{:<4} {:<8} {:<24} {}",
                index + 1,
                entry.status().as_str(),
                entry.display_label(),
                entry.absolute_path()
            );
            if let Some(comment) = entry.comment() {
                println!("{:<38} # {}", "", comment);
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
