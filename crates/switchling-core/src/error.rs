// ── Core error types ──
//
// User-facing errors from switchling-core. Consumers never see russh
// errors or channel internals directly — the `From<switchling_ssh::Error>`
// impl translates transport failures into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("cannot connect to {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("a session is already connected")]
    AlreadyConnected,

    #[error("not connected to any device")]
    NotConnected,

    #[error("operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("device channel closed: {reason}")]
    ChannelClosed { reason: String },

    // ── Command errors ───────────────────────────────────────────────
    /// The device rejected a command. When this comes out of a batch
    /// submission, the batch may be partially applied on the device and
    /// was deliberately NOT appended to the log.
    #[error("device rejected `{command}`: {message}")]
    Exec { command: String, message: String },

    // ── Persistence errors ───────────────────────────────────────────
    /// The durable log write failed. The batch IS applied on the device
    /// and recorded in memory — device state and the on-disk log have
    /// diverged, which is why this is surfaced rather than swallowed.
    #[error("failed to persist batch log at {path}: {reason}")]
    Persist { path: String, reason: String },

    // ── Replay errors ────────────────────────────────────────────────
    /// Replay stopped at the first failing batch; later batches were
    /// never issued (they may depend on the failed one).
    #[error("replay stopped at batch {failed_index} of {total} ({applied} applied): {reason}")]
    Replay {
        applied: usize,
        failed_index: usize,
        total: usize,
        reason: String,
    },

    // ── Validation errors ────────────────────────────────────────────
    #[error("a command batch must contain at least one line")]
    EmptyBatch,

    #[error("validation failed: {message}")]
    Validation { message: String },

    /// A port toggle needs a definite current status to flip from.
    #[error("administrative status of {interface} is unknown; refusing to toggle")]
    UnknownAdminStatus { interface: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<switchling_ssh::Error> for CoreError {
    fn from(err: switchling_ssh::Error) -> Self {
        match err {
            switchling_ssh::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            switchling_ssh::Error::Unreachable { host, reason } => {
                CoreError::ConnectionFailed { host, reason }
            }
            switchling_ssh::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            switchling_ssh::Error::CommandRejected { command, message } => {
                CoreError::Exec { command, message }
            }
            switchling_ssh::Error::ChannelClosed { reason } => CoreError::ChannelClosed { reason },
            switchling_ssh::Error::NotConnected => CoreError::NotConnected,
            switchling_ssh::Error::Ssh(e) => CoreError::ChannelClosed {
                reason: e.to_string(),
            },
            switchling_ssh::Error::Io(e) => CoreError::ChannelClosed {
                reason: e.to_string(),
            },
        }
    }
}

impl CoreError {
    /// Wrap a connect-phase transport error with the host it targeted.
    pub(crate) fn from_connect(host: &str, err: switchling_ssh::Error) -> Self {
        match err {
            switchling_ssh::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            switchling_ssh::Error::Unreachable { host, reason } => {
                CoreError::ConnectionFailed { host, reason }
            }
            other => CoreError::ConnectionFailed {
                host: host.to_owned(),
                reason: other.to_string(),
            },
        }
    }
}
