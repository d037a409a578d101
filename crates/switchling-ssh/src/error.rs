use thiserror::Error;

/// Top-level error type for the `switchling-ssh` crate.
///
/// Covers every failure mode of the device channel: authentication,
/// reachability, timeouts, command rejection, and channel loss.
/// `switchling-core` maps these into domain-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or privilege elevation failed (bad password or enable secret).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    // ── Reachability ────────────────────────────────────────────────
    /// The device could not be reached (DNS, refused, handshake failure).
    #[error("cannot reach {host}: {reason}")]
    Unreachable { host: String, reason: String },

    /// An operation exceeded its configured timeout.
    #[error("operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Command execution ───────────────────────────────────────────
    /// The device rejected a configuration line (`% ...` diagnostic).
    #[error("device rejected `{command}`: {message}")]
    CommandRejected { command: String, message: String },

    /// The shell channel closed while an operation was in flight.
    #[error("device channel closed: {reason}")]
    ChannelClosed { reason: String },

    /// Operation attempted on a session that is not open.
    #[error("not connected")]
    NotConnected,

    // ── Transport ───────────────────────────────────────────────────
    /// Low-level SSH protocol error.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Socket-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error indicates bad credentials or a bad
    /// enable secret (retrying without new credentials is pointless).
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::ChannelClosed { .. }
        )
    }
}
