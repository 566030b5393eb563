//! Preference storage for persisted state
//!
//! Persisted state is a text blob stored under a logical key. File-backed
//! preferences keep one `<key>.prefs` file per key and use file locking
//! plus temp-file-and-rename so readers never see a half-written value.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Invalid preference key: {0:?}")]
    InvalidKey(String),
}

/// Key/value text storage shared by the whole process
pub trait Preferences: Send + Sync {
    /// Reads the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences stored as files in a directory
pub struct FilePreferences {
    dir: PathBuf,
}

impl FilePreferences {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file backing a key
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PreferencesError::InvalidKey(key.to_string()).into());
        }
        Ok(self.dir.join(format!("{}.prefs", key)))
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open preferences: {}", path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on preferences")?;

        let mut value = String::new();
        (&file)
            .read_to_string(&mut value)
            .with_context(|| format!("Failed to read preferences: {}", path.display()))?;

        // Lock is released when file is dropped
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        let temp_path = path.with_extension("prefs.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on preferences")?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(value.as_bytes())
                .context("Failed to write preferences")?;
            writer.flush().context("Failed to flush preferences")?;
        }

        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Preferences held in memory only
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates preferences pre-seeded with one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let prefs = Self::new();
        prefs
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        prefs
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<P: Preferences + ?Sized> Preferences for std::sync::Arc<P> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }
}
