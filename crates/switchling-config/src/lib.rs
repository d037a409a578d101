//! Shared configuration for switchling front-ends.
//!
//! TOML settings (figment: file + env overrides), default paths via
//! `directories`, and the saved-hosts store — a plaintext JSON file of
//! per-host credentials keyed by unique host, as the device-lab workflow
//! expects. Front-ends resolve a `SavedHost` into a
//! `switchling_core::SessionConfig` and hand it to the core.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use switchling_core::{DeviceCredentials, SessionConfig, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Saved-hosts inserts are keyed by host; duplicates are rejected,
    /// never silently overwritten.
    #[error("host '{host}' already saved; duplicate not allowed")]
    DuplicateHost { host: String },

    #[error("no saved credentials for host '{host}'")]
    UnknownHost { host: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to serialize settings: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Top-level TOML settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// SSH port for device channels.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect + handshake timeout, seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Per-command timeout, seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    /// Batch log location; defaults into the project data directory.
    pub batch_log: Option<PathBuf>,

    /// Saved-hosts file location; defaults into the project data directory.
    pub saved_hosts: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            batch_log: None,
            saved_hosts: None,
        }
    }
}

fn default_port() -> u16 {
    22
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_command_timeout() -> u64 {
    30
}

impl Settings {
    /// Load settings: defaults, then the TOML file, then `SWITCHLING_*`
    /// env overrides (e.g. `SWITCHLING_DEFAULTS__PORT=2222`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SWITCHLING_").split("__"))
            .extract()?;
        Ok(settings)
    }

    /// Write the settings back out as TOML (used by a front-end's
    /// settings editor).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default settings file path (`settings.toml` in the config dir).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "switchling")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Resolved batch log path.
    pub fn batch_log_path(&self) -> PathBuf {
        self.defaults.batch_log.clone().unwrap_or_else(|| {
            data_dir().join("running-config.json")
        })
    }

    /// Resolved saved-hosts path.
    pub fn saved_hosts_path(&self) -> PathBuf {
        self.defaults.saved_hosts.clone().unwrap_or_else(|| {
            data_dir().join("saved-hosts.json")
        })
    }

    /// Transport tuning for the core.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            port: self.defaults.port,
            connect_timeout: Duration::from_secs(self.defaults.connect_timeout),
            command_timeout: Duration::from_secs(self.defaults.command_timeout),
            ..TransportConfig::default()
        }
    }

    /// Build a full session config for one saved host.
    pub fn session_config(&self, host: &SavedHost) -> SessionConfig {
        SessionConfig {
            credentials: host.credentials(),
            transport: self.transport(),
        }
    }
}

fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "switchling")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}

// ── Saved hosts ─────────────────────────────────────────────────────

/// One saved credential record. Plaintext on disk by design — this
/// mirrors the lab workflow's saved-inputs file, not a secrets vault.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SavedHost {
    pub host: String,
    pub username: String,
    pub password: String,
    pub secret: String,
}

impl SavedHost {
    /// Runtime credentials for the core (secrets wrapped immediately).
    pub fn credentials(&self) -> DeviceCredentials {
        DeviceCredentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: SecretString::from(self.password.clone()),
            secret: SecretString::from(self.secret.clone()),
        }
    }
}

/// The saved-hosts store: an ordered set of records, unique by host.
#[derive(Debug)]
pub struct HostStore {
    path: PathBuf,
    hosts: Vec<SavedHost>,
}

impl HostStore {
    /// Open a store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let hosts = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, hosts })
    }

    pub fn hosts(&self) -> &[SavedHost] {
        &self.hosts
    }

    pub fn find(&self, host: &str) -> Option<&SavedHost> {
        self.hosts.iter().find(|h| h.host == host)
    }

    /// Add a record. A record for the same host already exists ⇒
    /// `DuplicateHost`, and nothing is written.
    pub fn add(&mut self, record: SavedHost) -> Result<(), ConfigError> {
        if self.find(&record.host).is_some() {
            return Err(ConfigError::DuplicateHost { host: record.host });
        }
        self.hosts.push(record);
        self.persist()
    }

    /// Remove the record for `host`, persisting the change.
    pub fn remove(&mut self, host: &str) -> Result<(), ConfigError> {
        let before = self.hosts.len();
        self.hosts.retain(|h| h.host != host);
        if self.hosts.len() == before {
            return Err(ConfigError::UnknownHost {
                host: host.to_owned(),
            });
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&self.hosts)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}
