// ── Port toggle controller ──
//
// A 2-state machine per interface: Up flips to Down and back. Driven by
// the currently displayed status rather than a fresh query — no round
// trip, at the cost of staleness if the port changed out-of-band. The
// read-modify-write-persist flow here is the template every mutation in
// the system follows.

use tracing::info;

use crate::error::CoreError;
use crate::log::BatchLog;
use crate::model::{AdminStatus, CommandBatch};
use crate::session::SwitchSession;
use crate::store::SnapshotStore;

/// Build the batch that flips `current` for one interface.
pub fn toggle_batch(interface: &str, current: AdminStatus) -> Result<CommandBatch, CoreError> {
    let action = match current {
        AdminStatus::Up => "shutdown",
        AdminStatus::Down => "no shutdown",
        AdminStatus::Unknown => {
            return Err(CoreError::UnknownAdminStatus {
                interface: interface.to_owned(),
            });
        }
    };

    CommandBatch::new(vec![
        format!("interface {interface}"),
        action.to_owned(),
        "write memory".to_owned(),
    ])
}

/// Flip one interface's administrative status.
///
/// Applies the batch, appends it to the log, and recomputes the affected
/// snapshot entry. Returns the applied batch so the caller can update
/// its displayed status without re-querying. On any failure the caller's
/// prior displayed status stays authoritative — nothing is flipped.
pub async fn toggle_port(
    session: &SwitchSession,
    log: &mut BatchLog,
    store: &SnapshotStore,
    interface: &str,
    current: AdminStatus,
) -> Result<CommandBatch, CoreError> {
    let batch = toggle_batch(interface, current)?;

    session.apply_batch(&batch).await?;
    log.append(batch.clone())?;
    store.set_admin_status(interface, current.flipped());

    info!(
        host = %session.host(),
        interface,
        now = ?current.flipped(),
        "port toggled"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn up_port_gets_shutdown_batch() {
        let batch = toggle_batch("GigabitEthernet0/1", AdminStatus::Up).expect("valid");
        assert_eq!(
            batch.lines(),
            ["interface GigabitEthernet0/1", "shutdown", "write memory"]
        );
    }

    #[test]
    fn down_port_gets_no_shutdown_batch() {
        let batch = toggle_batch("GigabitEthernet0/1", AdminStatus::Down).expect("valid");
        assert_eq!(
            batch.lines(),
            ["interface GigabitEthernet0/1", "no shutdown", "write memory"]
        );
    }

    #[test]
    fn unknown_status_refuses_to_toggle() {
        assert!(matches!(
            toggle_batch("Gi0/1", AdminStatus::Unknown),
            Err(CoreError::UnknownAdminStatus { .. })
        ));
    }
}
