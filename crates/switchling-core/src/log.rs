// ── Durable batch log ──
//
// Append-only record of every successfully applied batch, replayed in
// insertion order after a reconnect. On-disk format: a JSON array of
// arrays of command lines — positional, human-inspectable, and stable
// under load/save round-trips.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::CommandBatch;
use crate::session::SwitchSession;

/// Outcome of a full replay. `applied == total` means every batch went
/// through; a short count only ever happens alongside a `Replay` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub total: usize,
}

/// Append-only durable store of applied command batches.
///
/// Insertion order is application order is replay order. The only
/// sanctioned non-append mutation is [`reset`](Self::reset).
#[derive(Debug)]
pub struct BatchLog {
    path: PathBuf,
    batches: Vec<CommandBatch>,
}

impl BatchLog {
    /// Open a log at `path`, loading any persisted batches. A missing
    /// file is an empty log, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();

        let batches = match fs::read(&path) {
            Ok(bytes) => {
                let raw: Vec<Vec<String>> =
                    serde_json::from_slice(&bytes).map_err(|e| CoreError::Persist {
                        path: path.display().to_string(),
                        reason: format!("corrupt log: {e}"),
                    })?;
                raw.into_iter()
                    .map(CommandBatch::new)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CoreError::Persist {
                        path: path.display().to_string(),
                        reason: "corrupt log: contains an empty batch".into(),
                    })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(CoreError::Persist {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        debug!(path = %path.display(), batches = batches.len(), "batch log opened");
        Ok(Self { path, batches })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full ordered log.
    pub fn batches(&self) -> &[CommandBatch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Append a successfully applied batch and persist synchronously.
    ///
    /// On a persistence failure the in-memory record stands (the device
    /// already applied the batch) and the divergence is reported through
    /// the returned `Persist` error.
    pub fn append(&mut self, batch: CommandBatch) -> Result<(), CoreError> {
        self.batches.push(batch);
        self.persist()
    }

    /// Clear the log. The only non-append mutation; replay after a reset
    /// starts from a clean slate.
    pub fn reset(&mut self) -> Result<(), CoreError> {
        info!(path = %self.path.display(), dropped = self.batches.len(), "batch log reset");
        self.batches.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::Persist {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let lines: Vec<&[String]> = self.batches.iter().map(CommandBatch::lines).collect();
        let body = serde_json::to_vec_pretty(&lines).map_err(|e| CoreError::Persist {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        fs::write(&self.path, body).map_err(|e| CoreError::Persist {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply every batch in log order against a connected session.
    ///
    /// Fail-fast: stops at the first failing batch and reports how far it
    /// got — later batches may presuppose earlier ones (an interface must
    /// exist before VLANs are assigned on it), so skip-and-continue would
    /// compound the damage. Never mutates the log itself, so cancelling a
    /// replay midway leaves the log exactly as it was.
    pub async fn replay_all(&self, session: &SwitchSession) -> Result<ReplayReport, CoreError> {
        let total = self.batches.len();

        for (index, batch) in self.batches.iter().enumerate() {
            if let Err(e) = session.apply_batch(batch).await {
                warn!(index, total, error = %e, "replay stopped at failing batch");
                return Err(CoreError::Replay {
                    applied: index,
                    failed_index: index,
                    total,
                    reason: e.to_string(),
                });
            }
        }

        if total > 0 {
            info!(total, "batch log replayed");
        }
        Ok(ReplayReport {
            applied: total,
            total,
        })
    }
}
