// ── Reactive snapshot store ──
//
// The single normalized view of device-reported state. Every
// presentation surface reads (or subscribes to) this store instead of
// re-fetching per widget. Mutations are broadcast via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{AdminStatus, InterfaceSnapshot, VlanRecord};

/// Reactive store for the current device-state view.
///
/// Snapshots are replaced wholesale on every sync pass; the only
/// targeted update is the admin-status flip after a port toggle.
pub struct SnapshotStore {
    interfaces: watch::Sender<Arc<Vec<InterfaceSnapshot>>>,
    vlans: watch::Sender<Arc<Vec<VlanRecord>>>,
    last_sync: watch::Sender<Option<DateTime<Utc>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (interfaces, _) = watch::channel(Arc::new(Vec::new()));
        let (vlans, _) = watch::channel(Arc::new(Vec::new()));
        let (last_sync, _) = watch::channel(None);
        Self {
            interfaces,
            vlans,
            last_sync,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn interfaces(&self) -> Arc<Vec<InterfaceSnapshot>> {
        self.interfaces.borrow().clone()
    }

    pub fn vlans(&self) -> Arc<Vec<VlanRecord>> {
        self.vlans.borrow().clone()
    }

    /// When the last successful full sync completed.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.borrow()
    }

    pub fn interface(&self, name: &str) -> Option<InterfaceSnapshot> {
        self.interfaces
            .borrow()
            .iter()
            .find(|i| i.name == name)
            .cloned()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_interfaces(&self) -> watch::Receiver<Arc<Vec<InterfaceSnapshot>>> {
        self.interfaces.subscribe()
    }

    pub fn subscribe_vlans(&self) -> watch::Receiver<Arc<Vec<VlanRecord>>> {
        self.vlans.subscribe()
    }

    // ── Mutation (sync + toggle paths only) ──────────────────────────

    pub(crate) fn set_interfaces(&self, interfaces: Vec<InterfaceSnapshot>) {
        self.interfaces.send_replace(Arc::new(interfaces));
    }

    pub(crate) fn set_vlans(&self, vlans: Vec<VlanRecord>) {
        self.vlans.send_replace(Arc::new(vlans));
    }

    pub(crate) fn push_vlan(&self, vlan: VlanRecord) {
        let mut next: Vec<VlanRecord> = self.vlans.borrow().as_ref().clone();
        next.retain(|v| v.number != vlan.number);
        next.push(vlan);
        self.vlans.send_replace(Arc::new(next));
    }

    /// Recompute one interface's admin status after a toggle.
    pub(crate) fn set_admin_status(&self, name: &str, status: AdminStatus) {
        let mut next: Vec<InterfaceSnapshot> = self.interfaces.borrow().as_ref().clone();
        if let Some(entry) = next.iter_mut().find(|i| i.name == name) {
            entry.admin_status = status;
            self.interfaces.send_replace(Arc::new(next));
        }
    }

    pub(crate) fn mark_synced(&self) {
        self.last_sync.send_replace(Some(Utc::now()));
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
