//! Favorites: user-defined key bindings loaded from a JSON file.
//!
//! The file is a flat object mapping key names to arbitrary payloads, e.g.
//! `{"F1": {"uri": "track1"}}`. Each payload is posted verbatim to the
//! favorite-play endpoint when its key is pressed.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use remotebuddy_common::tracing;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{FavoritesError, WatchError};

pub type FavoritesTable = HashMap<String, Value>;

/// Holds the current favorites table. Readers get cheap snapshots; a reload
/// swaps the whole table at once.
pub struct FavoritesStore {
    path: PathBuf,
    table: RwLock<Arc<FavoritesTable>>,
}

impl FavoritesStore {
    /// Create an empty store backed by `path`. Call [`reload`](Self::reload)
    /// to populate it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(Arc::new(FavoritesTable::new())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the favorites file and replace the table.
    ///
    /// Any failure leaves the table empty rather than keeping the previous
    /// contents. Returns the number of favorites now loaded.
    pub async fn reload(&self) -> usize {
        let table = match read_favorites(&self.path).await {
            Ok(table) => table,
            Err(FavoritesError::Read(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No favorites file at {}", self.path.display());
                FavoritesTable::new()
            }
            Err(e) => {
                warn!("Ignoring favorites from {}: {}", self.path.display(), e);
                FavoritesTable::new()
            }
        };

        let count = table.len();
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(table);
        info!("Loaded {} favorites", count);
        count
    }

    /// Payload bound to `key`, if any
    pub fn lookup(&self, key: &str) -> Option<Value> {
        self.snapshot().get(key).cloned()
    }

    /// The table as of the last reload
    pub fn snapshot(&self) -> Arc<FavoritesTable> {
        Arc::clone(&self.table.read().unwrap_or_else(|e| e.into_inner()))
    }
}

async fn read_favorites(path: &Path) -> Result<FavoritesTable, FavoritesError> {
    let content = tokio::fs::read_to_string(path).await?;
    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(FavoritesError::NotAMapping),
    }
}

/// Watches the directory containing the favorites file and queues the
/// changed path whenever the file is created, modified or removed.
pub struct FavoritesFileWatcher {
    /// Kept alive to maintain the OS watch
    _watcher: RecommendedWatcher,
}

impl FavoritesFileWatcher {
    pub fn start(path: &Path, tx: mpsc::UnboundedSender<PathBuf>) -> Result<Self, WatchError> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| WatchError::NoParent(path.to_path_buf()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| WatchError::NoParent(path.to_path_buf()))?;

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    for changed in event.paths {
                        if changed.file_name() == Some(file_name.as_os_str()) {
                            debug!("Favorites file changed: {}", changed.display());
                            let _ = tx.send(changed);
                            break;
                        }
                    }
                }
                Err(e) => error!("Favorites watcher error: {}", e),
            }
        })?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Watching {} for favorites changes", dir.display());

        Ok(Self { _watcher: watcher })
    }
}
