// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TOML configuration, loaded once at startup and never hot-reloaded.
//!
//! Everything the spec calls an "operator-editable setting" is instead
//! reachable at runtime through [`host_settings::SettingsStore`]; what
//! lives here is the handful of choices that can only be made once, before
//! any of that state exists: where data is kept, which release flavor's
//! size/timing constants apply, and what address to listen on.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use host_types::ReleaseFlavor;

fn default_listen_address() -> SocketAddr {
    "0.0.0.0:9982".parse().expect("default listen address is valid")
}

fn default_flavor() -> ReleaseFlavor {
    ReleaseFlavor::Production
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageFolderConfig {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persistent database, the sector symlink tree,
    /// and the host's signing key. Created on first run.
    pub persist_dir: PathBuf,
    /// Address the negotiation listener binds and advertises in settings.
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    #[serde(default = "default_flavor")]
    pub flavor: ReleaseFlavor,
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// If set, logs are additionally appended to a rolling file under this
    /// directory rather than only going to stderr.
    pub log_dir: Option<PathBuf>,
    /// Storage folders to register on first run. Ignored on subsequent
    /// runs once the folder registry already has entries; manage folders
    /// afterward through the sector engine directly.
    #[serde(default)]
    pub storage_folders: Vec<StorageFolderConfig>,
    /// Skip opening `sled` and keep all state in memory; for local
    /// development and integration tests, never for a real deployment.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// The conventional config path under the OS's config directory
    /// (`~/.config/storage-host/config.toml` on Linux), used when `--config`
    /// is not given and a file happens to exist there.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "example", "storage-host")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn default_persist_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "example", "storage-host")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg = Config::from_toml_str(r#"persist_dir = "/tmp/storage-host""#).unwrap();
        assert_eq!(cfg.persist_dir, PathBuf::from("/tmp/storage-host"));
        assert_eq!(cfg.listen_address, default_listen_address());
        assert!(!cfg.ephemeral);
        assert!(cfg.storage_folders.is_empty());
    }

    #[test]
    fn storage_folders_parse() {
        let cfg = Config::from_toml_str(
            r#"
            persist_dir = "/tmp/storage-host"
            [[storage_folders]]
            path = "/mnt/disk0"
            size_bytes = 1099511627776
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage_folders.len(), 1);
        assert_eq!(cfg.storage_folders[0].size_bytes, 1_099_511_627_776);
    }
}
