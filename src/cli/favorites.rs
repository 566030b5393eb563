//! Favorites CLI commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use super::output::Output;
use super::session::Session;
use crate::domain::EntryKey;
use crate::store::{DropLocation, ResourceDelta};

/// Where `move` places the block
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct MoveTarget {
    /// Place before this favorite
    #[arg(long, value_name = "PATH")]
    pub before: Option<PathBuf>,

    /// Place after this favorite
    #[arg(long, value_name = "PATH")]
    pub after: Option<PathBuf>,

    /// Drop onto this favorite (places after it)
    #[arg(long, value_name = "PATH")]
    pub on: Option<PathBuf>,
}

impl MoveTarget {
    fn resolve(&self) -> (Option<&Path>, DropLocation) {
        match (&self.before, &self.after, &self.on) {
            (Some(path), _, _) => (Some(path.as_path()), DropLocation::Before),
            (_, Some(path), _) => (Some(path.as_path()), DropLocation::After),
            (_, _, Some(path)) => (Some(path.as_path()), DropLocation::On),
            _ => (None, DropLocation::None),
        }
    }
}

pub fn list(session: &Session, output: &Output) -> Result<()> {
    output.entries(&session.store.entries());
    Ok(())
}

pub fn add(session: &Session, output: &Output, paths: &[PathBuf]) -> Result<()> {
    let before = session.store.len();
    let requests: Vec<_> = paths.iter().map(|path| session.add_request(path)).collect();

    let changed = session.store.add_many(requests);
    let added = session.store.len() - before;

    if output.is_json() {
        output.data(&serde_json::json!({
            "added": added,
            "changed": changed,
            "total": session.store.len(),
        }));
    } else if added == 0 {
        println!("No new favorites");
    } else {
        output.success(&format!("Added {} favorite(s)", added));
    }
    Ok(())
}

pub fn remove(session: &Session, output: &Output, paths: &[PathBuf]) -> Result<()> {
    let keys = stored_keys(session, output, paths);
    let count = keys.len();

    if session.store.remove(keys) {
        output.success(&format!("Removed {} favorite(s)", count));
    } else if !output.is_json() {
        println!("Nothing to remove");
    }
    Ok(())
}

pub fn move_entries(
    session: &Session,
    output: &Output,
    paths: &[PathBuf],
    target: &MoveTarget,
) -> Result<()> {
    let (target_path, location) = target.resolve();
    let target_key = target_path
        .map(|path| session.stored_key(path))
        .transpose()?;

    let keys = stored_keys(session, output, paths);
    if keys.is_empty() {
        anyhow::bail!("No favorites to move");
    }

    session
        .store
        .move_entries(keys, target_key.as_ref(), location);
    output.entries(&session.store.entries());
    Ok(())
}

pub fn comment(session: &Session, output: &Output, path: &Path, text: Option<&str>) -> Result<()> {
    let key = session.stored_key(path)?;

    if session.store.update_comment(&key, text) {
        match text.filter(|text| !text.trim().is_empty()) {
            Some(_) => output.success(&format!("Updated comment on {}", path.display())),
            None => output.success(&format!("Cleared comment on {}", path.display())),
        }
    } else if !output.is_json() {
        println!("Comment unchanged");
    }
    Ok(())
}

/// Re-probes every favorite and reports the missing ones
pub fn check(session: &Session, output: &Output) -> Result<()> {
    session
        .store
        .on_external_change(&ResourceDelta::root(Vec::new()));

    let snapshot = session.store.entries();
    let missing: Vec<_> = snapshot.iter().filter(|entry| entry.is_missing()).collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "total": snapshot.len(),
            "missing": missing,
        }));
    } else if missing.is_empty() {
        println!("All {} favorite(s) present", snapshot.len());
    } else {
        println!("{} of {} favorite(s) missing:", missing.len(), snapshot.len());
        for entry in missing {
            println!("  {}", entry.absolute_path());
        }
    }
    Ok(())
}

fn stored_keys(session: &Session, output: &Output, paths: &[PathBuf]) -> Vec<EntryKey> {
    paths
        .iter()
        .filter_map(|path| match session.stored_key(path) {
            Ok(key) => Some(key),
            Err(error) => {
                output.warn(&format!("{:#}", error));
                None
            }
        })
        .collect()
}
