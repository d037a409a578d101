// ── State synchronizer ──
//
// Connect-time refresh: pull the device's interface and VLAN reports,
// normalize them into snapshots, then replay the batch log so device
// state reflects history. Each report gets its own small parser with
// documented column assumptions — no ad hoc splitting at call sites.

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::log::{BatchLog, ReplayReport};
use crate::model::{AdminStatus, InterfaceSnapshot, VlanRecord};
use crate::session::SwitchSession;
use crate::store::SnapshotStore;

const SHOW_INTERFACES: &str = "show ip interface brief";
const SHOW_VLANS: &str = "show vlan brief";

/// Outcome of a full sync pass. Each phase is reported distinctly: a
/// fetch failure never masks a replay failure, or vice versa.
#[derive(Debug)]
pub struct SyncReport {
    /// Interfaces fetched, or why the fetch failed.
    pub interfaces: Result<usize, CoreError>,
    /// VLANs fetched, or why the fetch failed.
    pub vlans: Result<usize, CoreError>,
    /// Replay outcome.
    pub replay: Result<ReplayReport, CoreError>,
}

impl SyncReport {
    /// True when every phase succeeded.
    pub fn is_complete(&self) -> bool {
        self.interfaces.is_ok() && self.vlans.is_ok() && self.replay.is_ok()
    }
}

/// Fetch and normalize the interface table.
pub async fn fetch_interfaces(session: &SwitchSession) -> Result<Vec<InterfaceSnapshot>, CoreError> {
    let raw = session.execute(SHOW_INTERFACES).await?;
    Ok(parse_interface_brief(&raw))
}

/// Fetch and normalize the VLAN table.
pub async fn fetch_vlans(session: &SwitchSession) -> Result<Vec<VlanRecord>, CoreError> {
    let raw = session.execute(SHOW_VLANS).await?;
    Ok(parse_vlan_brief(&raw))
}

/// Run the full connect-time refresh: interfaces, VLANs, then replay.
///
/// Snapshot first so consumers can show the "before" state; replay after
/// so the device reflects history. Fetch failures do not stop the replay
/// — replay is the higher-value operation — but every partial failure is
/// reported in the returned [`SyncReport`].
pub async fn sync_all(
    session: &SwitchSession,
    log: &BatchLog,
    store: &SnapshotStore,
) -> SyncReport {
    let interfaces = match fetch_interfaces(session).await {
        Ok(list) => {
            let count = list.len();
            store.set_interfaces(list);
            Ok(count)
        }
        Err(e) => {
            warn!(error = %e, "interface fetch failed; continuing sync");
            Err(e)
        }
    };

    let vlans = match fetch_vlans(session).await {
        Ok(list) => {
            let count = list.len();
            store.set_vlans(list);
            Ok(count)
        }
        Err(e) => {
            warn!(error = %e, "VLAN fetch failed; continuing sync");
            Err(e)
        }
    };

    let replay = log.replay_all(session).await;

    let report = SyncReport {
        interfaces,
        vlans,
        replay,
    };
    if report.is_complete() {
        store.mark_synced();
        debug!(host = %session.host(), "sync complete");
    }
    report
}

// ── Report parsers ───────────────────────────────────────────────────

/// Parse `show ip interface brief` output.
///
/// Column assumptions: `Interface  IP-Address  OK?  Method  Status  Protocol`,
/// whitespace-separated; the status column is token 5 (index 4), where an
/// administratively disabled port reports `administratively down` and the
/// first of those two tokens lands in the column. Header and banner lines
/// (anything mentioning `Interface`) and blank lines are skipped; a data
/// row missing its status column yields a snapshot with `Unknown` status.
pub fn parse_interface_brief(output: &str) -> Vec<InterfaceSnapshot> {
    output
        .lines()
        .filter(|line| !line.contains("Interface"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let name = *tokens.first()?;
            let status = tokens
                .get(4)
                .map_or(AdminStatus::Unknown, |t| AdminStatus::from_report_token(t));
            Some(InterfaceSnapshot {
                name: name.to_owned(),
                admin_status: status,
                vlan: None,
            })
        })
        .collect()
}

/// Parse `show vlan brief` output.
///
/// Column assumptions: `VLAN  Name  Status  Ports`, whitespace-separated;
/// only lines whose leading token is a numeric VLAN id are data rows
/// (headers, separators, and port-list continuation lines are not).
pub fn parse_vlan_brief(output: &str) -> Vec<VlanRecord> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let number: u16 = tokens.next()?.parse().ok()?;
            let name = tokens.next().unwrap_or_default().to_owned();
            Some(VlanRecord { number, name })
        })
        .collect()
}
