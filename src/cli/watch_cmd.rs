//! Watch command: keeps favorites in sync with the filesystem

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use super::output::Output;
use super::session::Session;
use crate::watch::FavoritesWatcher;

pub fn run(
    session: &Session,
    output: &Output,
    batch_millis: Option<u64>,
    duration_secs: Option<u64>,
) -> Result<()> {
    let batch_window = batch_millis
        .map(Duration::from_millis)
        .unwrap_or_else(|| session.config.watch.batch_window());

    let json = output.is_json();
    session.store.subscribe(move |snapshot| {
        let missing = snapshot.iter().filter(|entry| entry.is_missing()).count();
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "revision": snapshot.revision(),
                    "total": snapshot.len(),
                    "missing": missing,
                    "entries": snapshot.entries(),
                })
            );
        } else {
            println!(
                "Favorites changed: {} total, {} missing",
                snapshot.len(),
                missing
            );
        }
        Ok(())
    });

    let stop = Arc::new(AtomicBool::new(false));
    if let Some(secs) = duration_secs {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            stop.store(true, Ordering::Relaxed);
        });
    }

    let watcher = FavoritesWatcher::new(Arc::clone(&session.store), session.workspace.clone())
        .with_batch_window(batch_window);

    if !json {
        println!(
            "Watching {} favorite(s) in {} location(s)",
            session.store.len(),
            watcher.targets().len()
        );
    }

    let result = watcher.run(&stop);
    // The closing save must not drop favorites saved by other commands meanwhile.
    session.store.reload();
    result
}
