// Shared transport configuration for building SSH sessions.
//
// One struct carries port, timeout, and host-key policy so the shell
// layer never duplicates builder logic.

use std::sync::Arc;
use std::time::Duration;

/// How to treat an unrecognized host key.
///
/// Lab switches rarely have pinned keys, so the default accepts any key.
/// Strict mode refuses unknown keys and fails the connect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept whatever key the device presents.
    #[default]
    AcceptAny,
    /// Refuse unknown host keys.
    Strict,
}

/// Shared transport configuration for opening device channels.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// SSH port (device CLIs almost always listen on 22).
    pub port: u16,
    /// Timeout for TCP connect + SSH handshake.
    pub connect_timeout: Duration,
    /// Timeout applied to every exec / config-set read.
    pub command_timeout: Duration,
    /// SSH keepalive interval; `None` disables keepalives.
    pub keepalive: Option<Duration>,
    pub host_keys: HostKeyPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: Duration::from_secs(15),
            command_timeout: Duration::from_secs(30),
            keepalive: Some(Duration::from_secs(30)),
            host_keys: HostKeyPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build the russh client configuration for this transport.
    pub(crate) fn ssh_config(&self) -> Arc<russh::client::Config> {
        Arc::new(russh::client::Config {
            keepalive_interval: self.keepalive,
            inactivity_timeout: None,
            ..Default::default()
        })
    }

    /// Seconds of the command timeout, for error reporting.
    pub(crate) fn command_timeout_secs(&self) -> u64 {
        self.command_timeout.as_secs()
    }
}
