// ── Domain types ──
//
// Plain data carried between the session, the log, and the synchronizer.
// Snapshot types are derived views: rebuilt wholesale on every sync pass,
// never persisted.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Credentials for one device. Immutable for the lifetime of a session;
/// two concurrent sessions never share an instance.
#[derive(Debug, Clone)]
pub struct DeviceCredentials {
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Enable secret for privilege elevation.
    pub secret: SecretString,
}

/// An ordered, non-empty unit of CLI lines, applied atomically from the
/// caller's perspective (the device itself has no transactions — a batch
/// that fails partway is simply never logged).
///
/// `created_at` is a process-local ordering stamp. It is not persisted:
/// the on-disk log is positional, so ordering survives restarts without it.
#[derive(Debug, Clone)]
pub struct CommandBatch {
    lines: Vec<String>,
    created_at: DateTime<Utc>,
}

impl CommandBatch {
    /// Build a batch from ordered lines. Empty batches are invalid.
    pub fn new(lines: Vec<String>) -> Result<Self, CoreError> {
        if lines.is_empty() {
            return Err(CoreError::EmptyBatch);
        }
        Ok(Self {
            lines,
            created_at: Utc::now(),
        })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Administrative status of one interface, normalized from report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    Up,
    Down,
    Unknown,
}

impl AdminStatus {
    /// Normalize the status column of `show ip interface brief`.
    ///
    /// `administratively down` splits into two tokens; the first one is
    /// what lands in the status column, and it means Down.
    pub fn from_report_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "up" => Self::Up,
            "down" | "administratively" => Self::Down,
            _ => Self::Unknown,
        }
    }

    /// The status after a toggle.
    pub fn flipped(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Unknown => Self::Unknown,
        }
    }
}

/// Derived view of one interface. Superseded wholesale by the next sync
/// pass — there is no incremental merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    pub name: String,
    pub admin_status: AdminStatus,
    /// Access VLAN membership, when a report provides it. The brief
    /// interface report does not, so this is `None` after a plain sync.
    pub vlan: Option<u16>,
}

/// Derived view of one VLAN. The durable source of truth is the logged
/// creation batch, not this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub number: u16,
    pub name: String,
}
