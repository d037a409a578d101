// switchling-core: session lifecycle and command-batch replay engine
// for managed switches.

pub mod command;
pub mod error;
pub mod log;
pub mod manager;
pub mod model;
pub mod session;
pub mod store;
pub mod sync;
pub mod toggle;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    AgingMode, BatchRequest, DuplexMode, PortSecurityPolicy, PortSpeed, SwitchportMode,
    ViolationMode,
};
pub use error::CoreError;
pub use log::{BatchLog, ReplayReport};
pub use manager::Manager;
pub use model::{AdminStatus, CommandBatch, DeviceCredentials, InterfaceSnapshot, VlanRecord};
pub use session::{ConnectionState, SessionConfig, SwitchSession};
pub use store::SnapshotStore;
pub use sync::{SyncReport, fetch_interfaces, fetch_vlans, sync_all};

// Re-export the transport seam so consumers configure one crate.
pub use switchling_ssh::{DeviceLink, HostKeyPolicy, TransportConfig};
