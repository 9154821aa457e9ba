/// Per-host connection lifecycle with bounded retry
///
/// A session moves between `Disconnected` and `Connected`. Every failed
/// connect attempt is counted; after [`MAX_CONNECT_FAILURES`] consecutive
/// failures the session is `Blocked` and never attempts to connect again for
/// the lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use super::error::SessionError;
use super::metrics::{self, HostMetrics};
use super::transport::{RemoteShell, Transport};
use crate::utils::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, MAX_CONNECT_FAILURES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Blocked,
}

/// Point-in-time view of a session, safe to hand to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub connect_timeout: Duration,
    /// Applied to each metric command separately
    pub command_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

pub struct HostSession {
    host: String,
    transport: Arc<dyn Transport>,
    options: SessionOptions,
    shell: Option<Box<dyn RemoteShell>>,
    state: ConnectionState,
    consecutive_failures: u32,
}

impl HostSession {
    pub fn new(host: impl Into<String>, transport: Arc<dyn Transport>, options: SessionOptions) -> Self {
        Self {
            host: host.into(),
            transport,
            options,
            shell: None,
            state: ConnectionState::Disconnected,
            consecutive_failures: 0,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Open a new connection.
    ///
    /// Returns immediately without touching the network when blocked.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state == ConnectionState::Blocked {
            return Err(SessionError::Blocked { host: self.host.clone() });
        }

        if let Some(mut stale) = self.shell.take() {
            stale.close().await;
        }

        match self.transport.open(&self.host, self.options.connect_timeout).await {
            Ok(shell) => {
                self.shell = Some(shell);
                self.state = ConnectionState::Connected;
                self.consecutive_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.state = if self.consecutive_failures >= MAX_CONNECT_FAILURES {
                    ConnectionState::Blocked
                } else {
                    ConnectionState::Disconnected
                };
                Err(SessionError::Connect(e))
            }
        }
    }

    /// Fetch all four metrics over the open connection
    pub async fn fetch_metrics(&self) -> Result<HostMetrics, SessionError> {
        match (&self.shell, self.state) {
            (Some(shell), ConnectionState::Connected) => {
                Ok(metrics::collect(shell.as_ref(), &self.host, self.options.command_timeout).await)
            }
            _ => Err(SessionError::NotConnected { host: self.host.clone() }),
        }
    }

    /// Release the connection. Idempotent; a blocked session stays blocked.
    pub async fn disconnect(&mut self) {
        if let Some(mut shell) = self.shell.take() {
            shell.close().await;
        }

        if self.state != ConnectionState::Blocked {
            self.state = ConnectionState::Disconnected;
        }
    }
}
