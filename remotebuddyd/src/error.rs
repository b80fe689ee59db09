//! Error taxonomy for the daemon.
//!
//! Each boundary gets its own enum so callers can decide per kind whether
//! to ignore, log, or trigger a rescan.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from opening or reading input devices
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read error on {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from calls to the playback API
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("playback API answered with status {0}")]
    Status(u16),

    #[error("no answer within {0}ms")]
    Deadline(u64),
}

/// Errors from loading the favorites file
#[derive(Error, Debug)]
pub enum FavoritesError {
    #[error("failed to read favorites file: {0}")]
    Read(#[from] std::io::Error),

    #[error("favorites file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("favorites file must contain a JSON object keyed by key name")]
    NotAMapping,
}

/// Errors from setting up hot-plug or file watchers
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("udev monitor error: {0}")]
    Udev(#[source] std::io::Error),

    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("{0} has no parent directory to watch")]
    NoParent(PathBuf),
}

/// Errors from loading the daemon configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
