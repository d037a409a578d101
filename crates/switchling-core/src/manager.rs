// ── Manager facade ──
//
// The one surface a presentation layer talks to. Bundles the session,
// the batch log, and the snapshot store; every mutation goes through
// `submit` so it is uniformly applied-then-logged, and every read comes
// from the store or the raw `show` path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tracing::debug;

use switchling_ssh::DeviceLink;

use crate::command::BatchRequest;
use crate::error::CoreError;
use crate::log::BatchLog;
use crate::model::{AdminStatus, CommandBatch, InterfaceSnapshot, VlanRecord};
use crate::session::{ConnectionState, SessionConfig, SwitchSession};
use crate::store::SnapshotStore;
use crate::sync::{SyncReport, sync_all};
use crate::toggle;

/// One administered device: session + batch log + snapshot store.
///
/// Process-wide there is exactly one `Manager` per device; a second
/// device means a second independent `Manager` (and log file), never a
/// shared one.
pub struct Manager {
    session: SwitchSession,
    log: Mutex<BatchLog>,
    store: SnapshotStore,
}

impl Manager {
    pub fn new(config: SessionConfig, log: BatchLog) -> Self {
        Self {
            session: SwitchSession::new(config),
            log: Mutex::new(log),
            store: SnapshotStore::new(),
        }
    }

    pub fn session(&self) -> &SwitchSession {
        &self.session
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect, snapshot current device state, then replay the log.
    ///
    /// The connect itself must succeed; the returned [`SyncReport`]
    /// carries any partial sync failures distinctly.
    pub async fn connect(&self) -> Result<SyncReport, CoreError> {
        self.session.connect().await?;
        Ok(self.run_sync().await)
    }

    /// Same as [`connect()`](Self::connect) over a caller-supplied link.
    pub async fn connect_with(&self, link: Box<dyn DeviceLink>) -> Result<SyncReport, CoreError> {
        self.session.connect_with(link).await?;
        Ok(self.run_sync().await)
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    async fn run_sync(&self) -> SyncReport {
        let log = self.log.lock().await;
        sync_all(&self.session, &log, &self.store).await
    }

    /// Re-fetch snapshots without touching the log (no replay).
    pub async fn refresh_snapshots(&self) -> Result<(), CoreError> {
        let interfaces = crate::sync::fetch_interfaces(&self.session).await?;
        self.store.set_interfaces(interfaces);
        let vlans = crate::sync::fetch_vlans(&self.session).await?;
        self.store.set_vlans(vlans);
        self.store.mark_synced();
        Ok(())
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.session.connection_state()
    }

    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.session.connected_since()
    }

    /// Once-per-second connection duration, for a duration display.
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.session.elapsed()
    }

    // ── Cached snapshot accessors ────────────────────────────────────

    pub fn interfaces(&self) -> Arc<Vec<InterfaceSnapshot>> {
        self.store.interfaces()
    }

    pub fn vlans(&self) -> Arc<Vec<VlanRecord>> {
        self.store.vlans()
    }

    /// The applied-batch history (a clone; the log itself stays private).
    pub async fn history(&self) -> Vec<CommandBatch> {
        self.log.lock().await.batches().to_vec()
    }

    /// Drop all recorded history. The next connect replays nothing.
    pub async fn reset_log(&self) -> Result<(), CoreError> {
        self.log.lock().await.reset()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Apply a batch to the device and, only on success, append it to
    /// the log. The single mutation path — every configuration change
    /// flows through here so all of them are uniformly logged.
    ///
    /// Error semantics: [`CoreError::Exec`] means the device rejected a
    /// line — the batch may be partially applied and was NOT logged.
    /// [`CoreError::Persist`] means the device applied the whole batch
    /// and it is recorded in memory, but the durable write failed.
    pub async fn submit(&self, batch: CommandBatch) -> Result<CommandBatch, CoreError> {
        self.session.apply_batch(&batch).await?;
        self.log.lock().await.append(batch.clone())?;
        debug!(host = %self.session.host(), lines = batch.len(), "batch submitted");
        Ok(batch)
    }

    /// Render a typed request and submit it.
    pub async fn request(&self, request: BatchRequest) -> Result<CommandBatch, CoreError> {
        let batch = request.to_batch()?;
        let applied = self.submit(batch).await?;

        // VLAN creation is the one request whose effect the store can
        // reflect without a re-fetch.
        if let BatchRequest::CreateVlan { number, name } = request {
            self.store.push_vlan(VlanRecord { number, name });
        }
        Ok(applied)
    }

    /// Flip one interface's administrative status (see [`toggle`]).
    pub async fn toggle_port(
        &self,
        interface: &str,
        current: AdminStatus,
    ) -> Result<CommandBatch, CoreError> {
        let mut log = self.log.lock().await;
        toggle::toggle_port(&self.session, &mut log, &self.store, interface, current).await
    }

    // ── Raw query path ───────────────────────────────────────────────

    /// Run an ad hoc `show` command and return its text for display.
    /// Read-only from the engine's perspective: not parsed, not logged.
    pub async fn show(&self, command: &str) -> Result<String, CoreError> {
        self.session.execute(command).await
    }
}
