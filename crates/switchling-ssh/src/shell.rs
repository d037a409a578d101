// Raw PTY shell over an SSH channel.
//
// Owns the byte stream and the pattern buffer. Reads accumulate into the
// buffer and a tail search decides when the device has finished talking
// (the prompt is back). Command semantics (privilege elevation, config
// mode) live in `cli` — this module is transport mechanics only.

use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tracing::trace;

use crate::error::Error;
use crate::transport::TransportConfig;

/// A raw interactive shell on an open SSH channel.
pub(crate) struct RawShell {
    channel: Channel<Msg>,
    buffer: String,
    timeout_secs: u64,
    command_timeout: std::time::Duration,
}

impl RawShell {
    pub(crate) fn new(channel: Channel<Msg>, transport: &TransportConfig) -> Self {
        Self {
            channel,
            buffer: String::new(),
            timeout_secs: transport.command_timeout_secs(),
            command_timeout: transport.command_timeout,
        }
    }

    /// Send one line down the channel, clearing the pattern buffer first
    /// so the next read only sees this command's output.
    pub(crate) async fn send_line(&mut self, line: &str) -> Result<(), Error> {
        self.buffer.clear();
        let framed = format!("{line}\n");
        self.channel.data(framed.as_bytes()).await?;
        trace!(line, "sent");
        Ok(())
    }

    /// Read until `done` matches the buffer tail, or the command timeout
    /// elapses. Returns the accumulated buffer contents.
    pub(crate) async fn read_until(
        &mut self,
        done: impl Fn(&str) -> bool,
    ) -> Result<String, Error> {
        let deadline = tokio::time::Instant::now() + self.command_timeout;

        loop {
            if done(&self.buffer) {
                return Ok(std::mem::take(&mut self.buffer));
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| Error::Timeout {
                    timeout_secs: self.timeout_secs,
                })?;

            match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    self.buffer.push_str(&String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::Eof) | None => {
                    return Err(Error::ChannelClosed {
                        reason: "shell closed by device".into(),
                    });
                }
                Some(other) => trace!(?other, "ignoring channel message"),
            }
        }
    }

    /// Read until the device prompt is back.
    pub(crate) async fn read_to_prompt(&mut self) -> Result<String, Error> {
        self.read_until(ends_with_prompt).await
    }
}

// ── Pattern matching ─────────────────────────────────────────────────

/// True when the buffer's last line looks like a CLI prompt
/// (`Switch>`, `Switch#`, `Switch(config-if)#`).
pub(crate) fn ends_with_prompt(buffer: &str) -> bool {
    let tail = last_line(buffer);
    !tail.is_empty() && (tail.ends_with('>') || tail.ends_with('#'))
}

/// True when the device is asking for a password (login or enable).
pub(crate) fn ends_with_password_prompt(buffer: &str) -> bool {
    last_line(buffer).to_ascii_lowercase().ends_with("password:")
}

/// True when the prompt on the last line is unprivileged (`>`).
pub(crate) fn prompt_is_unprivileged(buffer: &str) -> bool {
    last_line(buffer).ends_with('>')
}

fn last_line(buffer: &str) -> &str {
    buffer.rsplit('\n').next().unwrap_or("").trim_end_matches('\r').trim_end()
}

/// Strip the echoed command from the front and the trailing prompt line
/// from the back, leaving only the device's report.
pub(crate) fn scrub(raw: &str, command: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().map(|l| l.trim_end_matches('\r')).collect();

    if lines.last().is_some_and(|l| {
        let t = l.trim_end();
        t.ends_with('>') || t.ends_with('#')
    }) {
        lines.pop();
    }

    if lines.first().is_some_and(|l| l.trim() == command.trim()) {
        lines.remove(0);
    }

    lines.join("\n").trim_matches('\n').to_owned()
}

/// Find a rejection diagnostic in scrubbed output. IOS-style CLIs flag
/// bad lines with a leading `%` (often under a `^` marker).
pub(crate) fn rejection(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim_start)
        .find(|l| l.starts_with('%'))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn prompt_detection_exec_and_config() {
        assert!(ends_with_prompt("sw01>"));
        assert!(ends_with_prompt("some output\r\nsw01#"));
        assert!(ends_with_prompt("sw01(config-if)#"));
        assert!(!ends_with_prompt("Building configuration...\r\n"));
        assert!(!ends_with_prompt(""));
    }

    #[test]
    fn password_prompt_detection() {
        assert!(ends_with_password_prompt("enable\r\nPassword:"));
        assert!(ends_with_password_prompt("Password: "));
        assert!(!ends_with_password_prompt("sw01#"));
    }

    #[test]
    fn privilege_detection() {
        assert!(prompt_is_unprivileged("sw01>"));
        assert!(!prompt_is_unprivileged("sw01#"));
    }

    #[test]
    fn scrub_removes_echo_and_prompt() {
        let raw = "show vlan brief\r\n1    default    active\r\n10   mgmt    active\r\nsw01#";
        assert_eq!(
            scrub(raw, "show vlan brief"),
            "1    default    active\n10   mgmt    active"
        );
    }

    #[test]
    fn scrub_of_silent_command_is_empty() {
        let raw = "terminal length 0\r\nsw01#";
        assert_eq!(scrub(raw, "terminal length 0"), "");
    }

    #[test]
    fn rejection_finds_percent_diagnostic() {
        let output = "        ^\n% Invalid input detected at '^' marker.";
        assert_eq!(rejection(output), Some("% Invalid input detected at '^' marker."));
        assert_eq!(rejection("VLAN 10 created"), None);
    }
}
