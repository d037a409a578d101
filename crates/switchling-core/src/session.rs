// ── Device session lifecycle ──
//
// Owns the authenticated channel to one switch. Handles connect /
// disconnect transitions, serializes command execution (the CLI channel
// is not multiplexable), and runs the elapsed-time ticker while
// connected. Exactly one session per device; multiple devices need
// independent instances.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchling_ssh::{CliSession, DeviceLink, TransportConfig};

use crate::error::CoreError;
use crate::model::{CommandBatch, DeviceCredentials};

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Configuration for one device session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub credentials: DeviceCredentials,
    pub transport: TransportConfig,
}

/// A session to one switch.
///
/// Cheaply cloneable via `Arc`. All device-touching calls are serialized
/// behind one async mutex; the elapsed ticker is an independent
/// cancellable task that never touches the channel.
#[derive(Clone)]
pub struct SwitchSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    state: watch::Sender<ConnectionState>,
    connected_since: watch::Sender<Option<DateTime<Utc>>>,
    elapsed: watch::Sender<Duration>,
    link: Mutex<Option<Box<dyn DeviceLink>>>,
    /// Replaced on every committed connect; cancelling it aborts
    /// in-flight calls (including a dial still in progress) and stops
    /// the ticker.
    cancel: StdMutex<CancellationToken>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
}

impl SwitchSession {
    /// Create a session. Does NOT connect — call [`connect()`](Self::connect).
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (connected_since, _) = watch::channel(None);
        let (elapsed, _) = watch::channel(Duration::ZERO);

        Self {
            inner: Arc::new(SessionInner {
                config,
                state,
                connected_since,
                elapsed,
                link: Mutex::new(None),
                cancel: StdMutex::new(CancellationToken::new()),
                ticker: StdMutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &str {
        &self.inner.config.credentials.host
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Open the authenticated channel and elevate privilege.
    ///
    /// Transitions Disconnected→Connecting→Connected; a dial failure
    /// lands in Failed with `connected_since` left unset. Connecting
    /// while a session is already up is a protocol misuse, not a
    /// reconnect. A `disconnect()` issued while the dial is in flight
    /// aborts it: the session settles in Disconnected and this returns
    /// `NotConnected`.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let abort = self.begin_connect()?;

        let creds = &self.inner.config.credentials;
        let dial = CliSession::connect(
            &creds.host,
            &creds.username,
            creds.password.expose_secret(),
            creds.secret.expose_secret(),
            &self.inner.config.transport,
        );

        let dialed = tokio::select! {
            biased;
            () = abort.cancelled() => {
                // disconnect() already settled the state.
                debug!(host = %creds.host, "connect aborted by disconnect");
                return Err(CoreError::NotConnected);
            }
            res = dial => res,
        };

        match dialed {
            Ok(link) => self.install_link(Box::new(link)).await,
            Err(e) => {
                // Only Connecting may become Failed; a disconnect that
                // raced the dial has already settled in Disconnected.
                self.inner.state.send_if_modified(|state| {
                    if *state == ConnectionState::Connecting {
                        *state = ConnectionState::Failed;
                        true
                    } else {
                        false
                    }
                });
                Err(CoreError::from_connect(&creds.host, e))
            }
        }
    }

    /// Connect over an already-open [`DeviceLink`].
    ///
    /// Same state machine as [`connect()`](Self::connect); used when the
    /// caller supplies its own transport (and by tests, which drive the
    /// session with scripted links).
    pub async fn connect_with(&self, link: Box<dyn DeviceLink>) -> Result<(), CoreError> {
        self.begin_connect()?;
        self.install_link(link).await
    }

    /// Atomically claim the Disconnected/Failed → Connecting transition.
    ///
    /// Installs and returns a fresh token for the dial phase — the slot
    /// may still hold the cancelled token of a previous teardown — so a
    /// concurrent `disconnect()` cancels exactly this attempt.
    fn begin_connect(&self) -> Result<CancellationToken, CoreError> {
        let mut already = false;
        self.inner.state.send_if_modified(|state| {
            if matches!(
                state,
                ConnectionState::Connected | ConnectionState::Connecting
            ) {
                already = true;
                false
            } else {
                *state = ConnectionState::Connecting;
                true
            }
        });

        if already {
            return Err(CoreError::AlreadyConnected);
        }

        let token = CancellationToken::new();
        *self
            .inner
            .cancel
            .lock()
            .expect("cancel lock poisoned") = token.clone();
        Ok(token)
    }

    /// Commit a dialed link, unless a disconnect raced the dial.
    ///
    /// Holds the link lock for the whole commit so `disconnect()` either
    /// runs entirely before (the commit is refused, the link closed) or
    /// entirely after (a normal teardown of the new connection).
    async fn install_link(&self, mut link: Box<dyn DeviceLink>) -> Result<(), CoreError> {
        let mut guard = self.inner.link.lock().await;

        let committed = self.inner.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        if !committed {
            if let Err(e) = link.close().await {
                warn!(host = %self.host(), error = %e, "device close failed (non-fatal)");
            }
            return Err(CoreError::NotConnected);
        }

        *guard = Some(link);

        let token = CancellationToken::new();
        *self
            .inner
            .cancel
            .lock()
            .expect("cancel lock poisoned") = token.clone();

        self.inner.connected_since.send_replace(Some(Utc::now()));
        self.inner.elapsed.send_replace(Duration::ZERO);

        // One ticker per connection; the commit above guarantees a
        // second one can never start alongside it.
        let session = self.clone();
        *self
            .inner
            .ticker
            .lock()
            .expect("ticker lock poisoned") = Some(tokio::spawn(ticker_task(session, token)));

        info!(host = %self.host(), "connected");
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Idempotent: with no prior connect this is a no-op that leaves the
    /// state Disconnected. Cancels any in-flight call (or dial) instead
    /// of waiting for it, awaits the ticker, and closes the channel — a
    /// close failure is logged, never allowed to keep the state
    /// Connected. Always settles in Disconnected, even when a connect is
    /// racing it.
    pub async fn disconnect(&self) {
        // First cancel unblocks any in-flight command holding the link
        // lock, and aborts a dial still in progress.
        self.current_cancel().cancel();

        let mut guard = self.inner.link.lock().await;

        // A connect may have committed while we waited for the lock; its
        // fresh token is the current one now.
        self.current_cancel().cancel();

        let ticker = self
            .inner
            .ticker
            .lock()
            .expect("ticker lock poisoned")
            .take();

        if let Some(mut link) = guard.take() {
            if let Err(e) = link.close().await {
                warn!(host = %self.host(), error = %e, "device close failed (non-fatal)");
            }
        }

        // Settle the terminal state while still holding the link lock,
        // so an install racing this teardown sees Disconnected and
        // refuses to commit.
        self.inner.elapsed.send_replace(Duration::ZERO);
        self.inner.connected_since.send_replace(None);
        self.inner.state.send_replace(ConnectionState::Disconnected);
        drop(guard);

        if let Some(handle) = ticker {
            let _ = handle.await;
        }
        debug!(host = %self.host(), "disconnected");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Run one exec-mode command and return its raw report text.
    pub async fn execute(&self, command: &str) -> Result<String, CoreError> {
        let cancel = self.current_cancel();
        let mut guard = self.inner.link.lock().await;
        let link = guard.as_mut().ok_or(CoreError::NotConnected)?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::NotConnected),
            res = link.exec(command) => res.map_err(CoreError::from),
        }
    }

    /// Apply a batch's lines in order inside a configuration context.
    ///
    /// Best-effort atomicity: on a mid-batch failure, lines already sent
    /// stay applied on the device (it has no transactions). Callers must
    /// only log the batch when this returns `Ok`.
    pub async fn apply_batch(&self, batch: &CommandBatch) -> Result<(), CoreError> {
        let cancel = self.current_cancel();
        let mut guard = self.inner.link.lock().await;
        let link = guard.as_mut().ok_or(CoreError::NotConnected)?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::NotConnected),
            res = link.apply_config(batch.lines()) => res.map_err(CoreError::from),
        }
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Wall-clock time the current connection was established, if any.
    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        *self.inner.connected_since.borrow()
    }

    /// Subscribe to the once-per-second connection duration.
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.inner.elapsed.subscribe()
    }

    fn current_cancel(&self) -> CancellationToken {
        self.inner
            .cancel
            .lock()
            .expect("cancel lock poisoned")
            .clone()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Publish the connection duration once per second until cancelled.
/// Reads only the clock; never contends with command execution.
async fn ticker_task(session: SwitchSession, cancel: CancellationToken) {
    let started = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                session.inner.elapsed.send_replace(started.elapsed());
            }
        }
    }
}
