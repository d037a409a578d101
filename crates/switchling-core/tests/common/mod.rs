// Scripted device link for driving the core without a switch.
#![allow(dead_code)] // each test binary uses its own subset of the harness
//
// Plays the role a mock HTTP server would for an HTTP client: canned
// responses per command, optional failure injection, and recorders the
// test keeps after the link is boxed into the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use switchling_core::{DeviceCredentials, DeviceLink, SessionConfig, TransportConfig};
use switchling_ssh::Error;

/// Shared view into what the link has seen.
#[derive(Clone, Default)]
pub struct Recorder {
    pub execs: Arc<Mutex<Vec<String>>>,
    pub batches: Arc<Mutex<Vec<Vec<String>>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl Recorder {
    pub fn exec_log(&self) -> Vec<String> {
        self.execs.lock().expect("recorder lock").clone()
    }

    pub fn batch_log(&self) -> Vec<Vec<String>> {
        self.batches.lock().expect("recorder lock").clone()
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock().expect("recorder lock")
    }
}

pub struct FakeLink {
    recorder: Recorder,
    responses: HashMap<String, String>,
    /// Fail the Nth `apply_config` call (0-based, counted by attempts
    /// that reached the device).
    fail_batch_at: Option<usize>,
    attempted_batches: usize,
    /// Every `exec` fails (fetch-failure scenarios).
    fail_exec: bool,
    /// `exec` never completes (in-flight cancellation scenarios).
    hang_exec: bool,
}

impl FakeLink {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::default(),
            responses: HashMap::new(),
            fail_batch_at: None,
            attempted_batches: 0,
            fail_exec: false,
            hang_exec: false,
        }
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_owned(), output.to_owned());
        self
    }

    pub fn fail_batch_at(mut self, index: usize) -> Self {
        self.fail_batch_at = Some(index);
        self
    }

    pub fn failing_exec(mut self) -> Self {
        self.fail_exec = true;
        self
    }

    pub fn hanging_exec(mut self) -> Self {
        self.hang_exec = true;
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

#[async_trait]
impl DeviceLink for FakeLink {
    async fn exec(&mut self, command: &str) -> Result<String, Error> {
        if self.hang_exec {
            std::future::pending::<()>().await;
        }
        if self.fail_exec {
            return Err(Error::ChannelClosed {
                reason: "scripted exec failure".into(),
            });
        }
        self.recorder
            .execs
            .lock()
            .expect("recorder lock")
            .push(command.to_owned());
        Ok(self.responses.get(command).cloned().unwrap_or_default())
    }

    async fn apply_config(&mut self, lines: &[String]) -> Result<(), Error> {
        let index = self.attempted_batches;
        self.attempted_batches += 1;

        if self.fail_batch_at == Some(index) {
            return Err(Error::CommandRejected {
                command: lines.first().cloned().unwrap_or_default(),
                message: "% Invalid input detected at '^' marker.".into(),
            });
        }

        self.recorder
            .batches
            .lock()
            .expect("recorder lock")
            .push(lines.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        *self.recorder.closed.lock().expect("recorder lock") = true;
        Ok(())
    }
}

/// A session config pointing at a lab device nothing will ever dial.
pub fn test_config() -> SessionConfig {
    SessionConfig {
        credentials: DeviceCredentials {
            host: "10.0.0.1".into(),
            username: "admin".into(),
            password: SecretString::from("password".to_owned()),
            secret: SecretString::from("enable".to_owned()),
        },
        transport: TransportConfig::default(),
    }
}

/// A session config aimed at a real local listener, for dial-path tests.
pub fn config_dialing(host: &str, port: u16, connect_timeout: Duration) -> SessionConfig {
    let mut config = test_config();
    config.credentials.host = host.to_owned();
    config.transport.port = port;
    config.transport.connect_timeout = connect_timeout;
    config
}
