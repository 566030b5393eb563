//! Opening the favorites store for one command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::{resolver, AddRequest, EntryKey, Workspace};
use crate::storage::{Config, FilePreferences};
use crate::store::FavoritesStore;

/// Where configuration, persisted favorites and the workspace live
#[derive(Args, Debug, Clone, Default)]
pub struct Location {
    /// Config file (defaults to config.toml in the user config directory)
    #[arg(long, global = true, env = "FAVS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding persisted favorites
    #[arg(long, global = true, env = "FAVS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Workspace root; favorites inside it are workspace members
    #[arg(long, global = true, env = "FAVS_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

impl Location {
    /// Loads the config file and applies command-line overrides
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.storage.dir = Some(dir.clone());
        }
        if let Some(root) = &self.workspace {
            config.workspace.root = Some(root.clone());
        }
        Ok(config)
    }
}

/// A loaded store plus the settings it was opened with
pub struct Session {
    pub config: Config,
    pub workspace: Option<Workspace>,
    pub store: Arc<FavoritesStore>,
}

impl Session {
    pub fn open(location: &Location) -> Result<Self> {
        let config = location.config()?;

        if let Some(policy) = config.paths.case_policy() {
            if !resolver::init_case_policy(policy) {
                tracing::debug!(?policy, "Case policy already fixed");
            }
        }

        let data_dir = config.data_dir()?;
        tracing::debug!(dir = %data_dir.display(), key = %config.storage.key, "Opening favorites");

        let store = FavoritesStore::new(Box::new(FilePreferences::new(data_dir)))
            .with_preference_key(config.storage.key.clone());
        store.load();

        let workspace = config.workspace.root.as_deref().map(Workspace::new);

        Ok(Self {
            config,
            workspace,
            store: Arc::new(store),
        })
    }

    /// Classifies a path as a workspace member or an external path
    pub fn add_request(&self, path: &Path) -> AddRequest {
        match &self.workspace {
            Some(workspace) => workspace.add_request(path),
            None => AddRequest::External(path.to_path_buf()),
        }
    }

    /// Resolves a user-supplied path to the key of a stored favorite
    pub fn stored_key(&self, path: &Path) -> Result<EntryKey> {
        let absolute = resolver::absolutize(path)
            .with_context(|| format!("Invalid path: {}", path.display()))?;
        let key = EntryKey::for_path(&absolute);
        if !self.store.contains(&key) {
            anyhow::bail!("Not a favorite: {}", absolute);
        }
        Ok(key)
    }

    /// Final save and listener detach
    pub fn close(self) {
        self.store.shutdown();
    }
}
