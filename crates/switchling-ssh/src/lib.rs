// switchling-ssh: Async SSH CLI channel to a managed switch.

pub mod cli;
pub mod error;
pub mod shell;
pub mod transport;

pub use cli::{CliSession, DeviceLink};
pub use error::Error;
pub use transport::{HostKeyPolicy, TransportConfig};
