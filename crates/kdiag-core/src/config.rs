//! Configuration for the diagnostic interface
//!
//! The only setting the command registry consumes is the allow-list string.
//! The rest of the file describes the in-memory coordination service that
//! `kdiag serve` runs behind the admin listener.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{config_error, ExError};
use crate::service::ConfigEntry;

/// Commands enabled when the configuration does not name any
///
/// Watch listings, `dump` and allocator commands must be enabled explicitly.
pub const DEFAULT_ALLOW_LIST: &str =
    "conf,cons,crst,envi,ruok,srst,srvr,stat,wchs,dirs,mntr,isro,rcvr,apiv,csnp,lgif,rqld,rclc,clrs,ftfl,ydld,pfev";

/// Default admin listen address
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9181";

const DEFAULT_SESSION_TIMEOUT_MS: u64 = 30_000;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KdiagConfig {
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub keeper: KeeperSettings,
}

impl KdiagConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::InvalidConfig` on malformed TOML or wrong value types.
    pub fn from_toml_str(content: &str) -> Result<Self, ExError> {
        toml::from_str(content).map_err(|e| config_error(format!("TOML parse error: {}", e)))
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::InvalidConfig` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ExError> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

/// `[admin]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AdminSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// `*`, or comma/whitespace separated four letter names
    #[serde(default = "default_allow_list")]
    pub four_letter_word_allow_list: String,
}

impl AdminSettings {
    pub fn with_allow_list(allow_list: impl Into<String>) -> Self {
        Self {
            four_letter_word_allow_list: allow_list.into(),
            ..Self::default()
        }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            four_letter_word_allow_list: default_allow_list(),
        }
    }
}

/// `[keeper]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KeeperSettings {
    #[serde(default = "default_server_id")]
    pub server_id: u64,
    #[serde(default)]
    pub log_storage_path: Option<PathBuf>,
    #[serde(default)]
    pub snapshot_storage_path: Option<PathBuf>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,
    /// Free-form coordination settings echoed by `conf`
    #[serde(default)]
    pub coordination_settings: BTreeMap<String, toml::Value>,
}

impl Default for KeeperSettings {
    fn default() -> Self {
        Self {
            server_id: default_server_id(),
            log_storage_path: None,
            snapshot_storage_path: None,
            read_only: false,
            session_timeout_ms: default_session_timeout_ms(),
            feature_flags: BTreeMap::new(),
            coordination_settings: BTreeMap::new(),
        }
    }
}

impl KeeperSettings {
    /// Flatten into the `key=value` entries the `conf` command prints
    pub fn entries(&self) -> Vec<ConfigEntry> {
        let mut entries = vec![
            ConfigEntry::new("server_id", self.server_id.to_string()),
            ConfigEntry::new("log_storage_path", display_path(&self.log_storage_path)),
            ConfigEntry::new(
                "snapshot_storage_path",
                display_path(&self.snapshot_storage_path),
            ),
            ConfigEntry::new("read_only", self.read_only.to_string()),
            ConfigEntry::new("session_timeout_ms", self.session_timeout_ms.to_string()),
        ];
        for (key, value) in &self.coordination_settings {
            let rendered = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            entries.push(ConfigEntry::new(
                format!("coordination_settings.{}", key),
                rendered,
            ));
        }
        entries
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_allow_list() -> String {
    DEFAULT_ALLOW_LIST.to_string()
}

fn default_server_id() -> u64 {
    1
}

fn default_session_timeout_ms() -> u64 {
    DEFAULT_SESSION_TIMEOUT_MS
}
