//! Console configuration: a TOML file plus command-line overrides.
//!
//! ```toml
//! store = "/var/lib/docq/store.json"
//! pretty = true
//! raw = false
//! spacing = 4
//!
//! [backup]
//! collection = "backup"
//! commands = ["update", "delete"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::display::OutputMode;
use crate::error::ConsoleError;

pub const DEFAULT_SPACING: usize = 2;
pub const DEFAULT_BACKUP_COLLECTION: &str = "backup";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the local store file.
    pub store: Option<PathBuf>,
    pub pretty: bool,
    /// Compact single-line JSON. Takes precedence over `pretty`.
    pub raw: bool,
    pub spacing: usize,
    pub backup: BackupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: None,
            pretty: true,
            raw: false,
            spacing: DEFAULT_SPACING,
            backup: BackupConfig::default(),
        }
    }
}

/// Which mutating commands record a before/after snapshot, and where.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub collection: String,
    pub commands: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_BACKUP_COLLECTION.to_string(),
            commands: Vec::new(),
        }
    }
}

impl BackupConfig {
    pub fn covers(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c.eq_ignore_ascii_case(command))
    }

    pub fn collection(&self) -> &str {
        if self.collection.is_empty() {
            DEFAULT_BACKUP_COLLECTION
        } else {
            &self.collection
        }
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub store: Option<PathBuf>,
    pub pretty: Option<bool>,
    pub raw: bool,
    pub spacing: Option<usize>,
}

/// `<config_dir>/docq/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docq").join("config.toml"))
}

fn default_store_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("docq").join("store.json"))
}

impl Config {
    /// Load from an explicit file, or from the default location if it
    /// exists. An explicit file that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConsoleError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConsoleError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConsoleError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConsoleError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(file = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(store) = overrides.store {
            self.store = Some(store);
        }
        if let Some(pretty) = overrides.pretty {
            self.pretty = pretty;
        }
        if overrides.raw {
            self.raw = true;
        }
        if let Some(spacing) = overrides.spacing {
            self.spacing = spacing;
        }
    }

    pub fn store_path(&self) -> Result<PathBuf, ConsoleError> {
        self.store
            .clone()
            .or_else(default_store_path)
            .ok_or(ConsoleError::NoStorePath)
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.raw || !self.pretty {
            OutputMode::Raw
        } else {
            OutputMode::Pretty {
                spacing: self.spacing,
            }
        }
    }
}
