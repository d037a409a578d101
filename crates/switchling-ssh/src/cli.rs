// Authenticated CLI session to one switch.
//
// Wraps the raw shell with device semantics: login, privilege elevation
// via `enable`, paging disabled, and the two primitives everything else
// is built on — `exec` (one exec-mode command, raw text back) and
// `config_set` (ordered lines inside a configuration context).

use async_trait::async_trait;
use russh::Disconnect;
use russh::client::{self, Handle};
use russh::keys::ssh_key;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::shell::{
    RawShell, ends_with_password_prompt, ends_with_prompt, prompt_is_unprivileged, rejection,
    scrub,
};
use crate::transport::{HostKeyPolicy, TransportConfig};

/// The seam between the transport and the session layer above it.
///
/// `CliSession` is the production implementation; tests drive the core
/// with scripted fakes. `&mut self` is deliberate — a device CLI channel
/// is not multiplexable, so callers must serialize access.
#[async_trait]
pub trait DeviceLink: Send {
    /// Run one exec-mode command, returning the raw report text.
    async fn exec(&mut self, command: &str) -> Result<String, Error>;

    /// Apply ordered configuration lines inside a configuration context.
    /// Fails at the first rejected line; earlier lines are not rolled back.
    async fn apply_config(&mut self, lines: &[String]) -> Result<(), Error>;

    /// Close the channel. Safe to call once; the link is unusable after.
    async fn close(&mut self) -> Result<(), Error>;
}

struct LinkHandler {
    host_keys: HostKeyPolicy,
}

impl client::Handler for LinkHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(matches!(self.host_keys, HostKeyPolicy::AcceptAny))
    }
}

/// An authenticated, privileged CLI session to one device.
pub struct CliSession {
    handle: Handle<LinkHandler>,
    shell: RawShell,
    host: String,
}

impl CliSession {
    /// Open, authenticate, and elevate a session.
    ///
    /// Dials the device, authenticates with `username`/`password`, opens a
    /// PTY shell, elevates privilege with `enable` + `secret` when the
    /// device lands in an unprivileged prompt, and disables paging.
    pub async fn connect(
        host: &str,
        username: &str,
        password: &str,
        secret: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let handler = LinkHandler {
            host_keys: transport.host_keys,
        };
        let config = transport.ssh_config();
        let addr = (host, transport.port);

        debug!(host, port = transport.port, "dialing device");
        let mut handle = tokio::time::timeout(
            transport.connect_timeout,
            client::connect(config, addr, handler),
        )
        .await
        .map_err(|_| Error::Unreachable {
            host: host.to_owned(),
            reason: format!(
                "connect timed out after {}s",
                transport.connect_timeout.as_secs()
            ),
        })?
        .map_err(|e| Error::Unreachable {
            host: host.to_owned(),
            reason: e.to_string(),
        })?;

        let auth = handle.authenticate_password(username, password).await?;
        if !auth.success() {
            return Err(Error::Authentication {
                message: format!("device {host} rejected credentials for {username}"),
            });
        }

        let channel = handle.channel_open_session().await?;
        channel.request_pty(false, "vt100", 200, 50, 0, 0, &[]).await?;
        channel.request_shell(false).await?;

        let mut shell = RawShell::new(channel, transport);

        // Swallow the login banner and find the initial prompt.
        let banner = shell.read_to_prompt().await?;

        let mut session = Self {
            handle,
            shell,
            host: host.to_owned(),
        };

        if prompt_is_unprivileged(&banner) {
            session.elevate(secret).await?;
        }

        // Paging would stall every multi-page report on a `--More--` line.
        session.exec("terminal length 0").await?;

        info!(host, "device session established");
        Ok(session)
    }

    /// Elevate to privileged exec mode with `enable` + the supplied secret.
    async fn elevate(&mut self, secret: &str) -> Result<(), Error> {
        self.shell.send_line("enable").await?;
        let reply = self
            .shell
            .read_until(|b| ends_with_prompt(b) || ends_with_password_prompt(b))
            .await?;

        if ends_with_password_prompt(&reply) {
            self.shell.send_line(secret).await?;
            let outcome = self
                .shell
                .read_until(|b| ends_with_prompt(b) || ends_with_password_prompt(b))
                .await?;

            // A re-issued password prompt or a lingering `>` means the
            // secret was rejected.
            if ends_with_password_prompt(&outcome)
                || prompt_is_unprivileged(&outcome)
                || outcome.contains("Access denied")
                || outcome.contains("Bad secrets")
            {
                return Err(Error::Authentication {
                    message: format!("device {} rejected the enable secret", self.host),
                });
            }
        } else if prompt_is_unprivileged(&reply) {
            return Err(Error::Authentication {
                message: format!("device {} refused privilege elevation", self.host),
            });
        }

        debug!(host = %self.host, "privileged exec mode");
        Ok(())
    }

    /// Run one exec-mode command and return its scrubbed report text.
    pub async fn exec(&mut self, command: &str) -> Result<String, Error> {
        self.shell.send_line(command).await?;
        let raw = self.shell.read_to_prompt().await?;
        Ok(scrub(&raw, command))
    }

    /// Send a line inside the configuration context and fail on a `%`
    /// diagnostic from the device.
    async fn config_line(&mut self, line: &str) -> Result<(), Error> {
        self.shell.send_line(line).await?;
        let raw = self.shell.read_to_prompt().await?;
        let output = scrub(&raw, line);

        if let Some(diag) = rejection(&output) {
            return Err(Error::CommandRejected {
                command: line.to_owned(),
                message: diag.to_owned(),
            });
        }
        Ok(())
    }

    /// Apply ordered configuration lines: `configure terminal`, each line
    /// in sequence, then `end`. Stops at the first rejected line — lines
    /// already accepted stay applied (the device has no transactions).
    pub async fn config_set(&mut self, lines: &[String]) -> Result<(), Error> {
        self.config_line("configure terminal").await?;

        let mut result = Ok(());
        for line in lines {
            if let Err(e) = self.config_line(line).await {
                warn!(host = %self.host, command = %line, "configuration line rejected");
                result = Err(e);
                break;
            }
        }

        // Best effort: always try to leave config mode, even after a
        // rejection, so the channel stays usable for the caller.
        let leave = self.config_line("end").await;
        result.and(leave)
    }

    /// Close the channel and disconnect from the device.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await?;
        debug!(host = %self.host, "device session closed");
        Ok(())
    }

    /// The host this session is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl DeviceLink for CliSession {
    async fn exec(&mut self, command: &str) -> Result<String, Error> {
        CliSession::exec(self, command).await
    }

    async fn apply_config(&mut self, lines: &[String]) -> Result<(), Error> {
        self.config_set(lines).await
    }

    async fn close(&mut self) -> Result<(), Error> {
        CliSession::close(self).await
    }
}
