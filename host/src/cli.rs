// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line entrypoint arguments. Everything that can instead live in
//! the TOML config does; flags here either locate that file or override
//! the one or two settings an operator commonly wants to flip for a single
//! run (an ephemeral dev instance, a different listen port).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use host_types::ReleaseFlavor;

#[derive(Parser, Debug)]
#[command(name = "host", about = "Decentralized storage-host daemon", version)]
pub struct Cli {
    /// Path to a TOML config file. Defaults to the OS config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides `persist_dir` from the config file.
    #[arg(long)]
    pub persist_dir: Option<PathBuf>,

    /// Overrides `listen_address` from the config file.
    #[arg(long)]
    pub listen_address: Option<SocketAddr>,

    /// Runs with an in-memory store and a freshly generated identity;
    /// nothing survives process exit. For local development only.
    #[arg(long)]
    pub ephemeral: bool,

    /// Overrides `flavor` from the config file.
    #[arg(long, value_enum)]
    pub flavor: Option<CliFlavor>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CliFlavor {
    Production,
    Development,
    Testing,
}

impl From<CliFlavor> for ReleaseFlavor {
    fn from(flavor: CliFlavor) -> Self {
        match flavor {
            CliFlavor::Production => ReleaseFlavor::Production,
            CliFlavor::Development => ReleaseFlavor::Development,
            CliFlavor::Testing => ReleaseFlavor::Testing,
        }
    }
}

impl Cli {
    /// Resolves a [`Config`], preferring an explicit `--config` path, then
    /// the OS default path if a file happens to exist there, then a config
    /// built entirely from flags and built-in defaults. CLI flags always
    /// win over whatever the file says.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let path = self.config.clone().or_else(Config::default_path);
        let mut config = match path.filter(|p| p.exists()) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
                Config::from_toml_str(&raw)?
            }
            None => Config {
                persist_dir: Config::default_persist_dir()
                    .ok_or_else(|| anyhow::anyhow!("no --persist-dir given and no OS default directory is available"))?,
                listen_address: "0.0.0.0:9982".parse().expect("static address is valid"),
                flavor: ReleaseFlavor::Production,
                log_filter: "info".to_string(),
                log_dir: None,
                storage_folders: Vec::new(),
                ephemeral: false,
            },
        };

        if let Some(dir) = &self.persist_dir {
            config.persist_dir = dir.clone();
        }
        if let Some(addr) = self.listen_address {
            config.listen_address = addr;
        }
        if let Some(flavor) = self.flavor {
            config.flavor = flavor.into();
        }
        if self.ephemeral {
            config.ephemeral = true;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &std::path::Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn file_values_are_used_when_no_flags_override_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            persist_dir = "/var/lib/storage-host"
            listen_address = "0.0.0.0:1234"
            "#,
        );
        let cli = Cli {
            config: Some(path),
            persist_dir: None,
            listen_address: None,
            ephemeral: false,
            flavor: None,
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.persist_dir, PathBuf::from("/var/lib/storage-host"));
        assert_eq!(config.listen_address, "0.0.0.0:1234".parse().unwrap());
        assert!(!config.ephemeral);
    }

    #[test]
    fn cli_flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"persist_dir = "/var/lib/storage-host""#);
        let cli = Cli {
            config: Some(path),
            persist_dir: Some(PathBuf::from("/tmp/override")),
            listen_address: Some("127.0.0.1:9999".parse().unwrap()),
            ephemeral: true,
            flavor: Some(CliFlavor::Testing),
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.persist_dir, PathBuf::from("/tmp/override"));
        assert_eq!(config.listen_address, "127.0.0.1:9999".parse().unwrap());
        assert!(config.ephemeral);
        assert_eq!(config.flavor, ReleaseFlavor::Testing);
    }

    #[test]
    fn a_nonexistent_config_path_falls_back_to_flag_and_default_values() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/path/config.toml")),
            persist_dir: Some(PathBuf::from("/tmp/override")),
            listen_address: None,
            ephemeral: false,
            flavor: None,
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.persist_dir, PathBuf::from("/tmp/override"));
        assert_eq!(config.flavor, ReleaseFlavor::Production);
    }
}
