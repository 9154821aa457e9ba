/// Background polling loop
///
/// One sweep visits every host session: connect if needed, fetch if
/// connected, publish into the [`MetricsStore`]. Sweeps repeat after a fixed
/// pause until the stop signal is raised. The stop signal is checked before
/// each sweep and between hosts, and cuts the pause short.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::error::SessionError;
use super::session::{ConnectionState, HostSession};
use super::store::MetricsStore;

/// How hosts are visited within one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// One host after another; a slow host delays the rest of the sweep
    #[default]
    Serial,
    /// All hosts at once, joined before the pause
    Concurrent,
}

pub struct MetricsPoller {
    sessions: Vec<HostSession>,
    store: Arc<MetricsStore>,
    interval: Duration,
    mode: PollMode,
}

impl MetricsPoller {
    pub fn new(sessions: Vec<HostSession>, store: Arc<MetricsStore>, interval: Duration) -> Self {
        Self {
            sessions,
            store,
            interval,
            mode: PollMode::Serial,
        }
    }

    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sessions(&self) -> &[HostSession] {
        &self.sessions
    }

    /// Run one sweep. Returns `false` if it was cut short by the stop signal.
    pub async fn sweep(&mut self, stop: &watch::Receiver<bool>) -> bool {
        let started = Instant::now();

        let completed = match self.mode {
            PollMode::Serial => {
                let mut completed = true;
                for session in &mut self.sessions {
                    if *stop.borrow() {
                        completed = false;
                        break;
                    }
                    poll_host(session, &self.store).await;
                }
                completed
            }
            PollMode::Concurrent => {
                if *stop.borrow() {
                    false
                } else {
                    let store = &self.store;
                    futures::future::join_all(self.sessions.iter_mut().map(|s| poll_host(s, store))).await;
                    true
                }
            }
        };

        if completed {
            self.store.mark_sweep(Local::now());
        }
        trace!(elapsed_ms = started.elapsed().as_millis() as u64, completed, "Sweep finished");

        completed
    }

    /// Sweep until stopped, then hand the sessions back to the caller
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Vec<HostSession> {
        info!(hosts = self.sessions.len(), mode = ?self.mode, "Poller started");

        while !*stop.borrow() {
            if !self.sweep(&stop).await {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        // sender gone, nobody can stop us any more
                        break;
                    }
                }
            }
        }

        info!("Poller stopped");
        self.sessions
    }

    /// Start the loop as a background task
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        PollerHandle { stop_tx, task }
    }
}

async fn poll_host(session: &mut HostSession, store: &MetricsStore) {
    if !session.is_connected() {
        match session.connect().await {
            Ok(()) => info!(host = session.host(), "Connected"),
            Err(SessionError::Blocked { .. }) => {}
            Err(e) => {
                if session.state() == ConnectionState::Blocked {
                    warn!(
                        host = session.host(),
                        failures = session.consecutive_failures(),
                        error = %e,
                        "Giving up on host after repeated connection failures"
                    );
                } else {
                    warn!(
                        host = session.host(),
                        attempt = session.consecutive_failures(),
                        error = %e,
                        "Connection failed"
                    );
                }
            }
        }
        store.set_status(session.host(), session.status());
    }

    if session.is_connected() {
        match session.fetch_metrics().await {
            Ok(metrics) => store.set(session.host(), metrics),
            Err(e) => debug!(host = session.host(), error = %e, "Fetch skipped"),
        }
    }
}

/// Handle to a running poller
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Vec<HostSession>>,
}

impl PollerHandle {
    /// Signal the poller to stop and wait for it to return its sessions
    pub async fn shutdown(self) -> Vec<HostSession> {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Poller task ended abnormally");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TransportError;
    use crate::core::session::{SessionOptions, SessionStatus};
    use crate::core::transport::{MockRemoteShell, MockTransport, RemoteShell, Transport};

    fn healthy_shell() -> Box<dyn RemoteShell> {
        let mut shell = MockRemoteShell::new();
        shell.expect_run().returning(|command| {
            if command.starts_with("top") {
                Ok("42%\n".to_string())
            } else {
                Ok("fine\n".to_string())
            }
        });
        shell.expect_close().returning(|| ());
        Box::new(shell)
    }

    fn transport() -> Arc<dyn Transport> {
        let mut transport = MockTransport::new();
        transport.expect_open().returning(|host, _| {
            if host.starts_with("up") {
                Ok(healthy_shell())
            } else {
                Err(TransportError::Connect {
                    host: host.to_string(),
                    reason: "No route to host".to_string(),
                })
            }
        });
        Arc::new(transport)
    }

    fn poller(hosts: &[&str], store: &Arc<MetricsStore>) -> MetricsPoller {
        let transport = transport();
        let sessions = hosts
            .iter()
            .map(|h| HostSession::new(*h, Arc::clone(&transport), SessionOptions::default()))
            .collect();
        MetricsPoller::new(sessions, Arc::clone(store), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_sweep_publishes_metrics_and_status() {
        let store = Arc::new(MetricsStore::new());
        let mut poller = poller(&["up-1", "down-1"], &store);
        let (_tx, rx) = watch::channel(false);

        assert!(poller.sweep(&rx).await);

        assert_eq!(store.get("up-1").unwrap().cpu_utilization, "42%");
        assert!(store.get("down-1").is_none());
        assert_eq!(
            store.status("down-1"),
            SessionStatus {
                state: ConnectionState::Disconnected,
                consecutive_failures: 1
            }
        );
        assert!(store.last_sweep().is_some());
    }

    #[tokio::test]
    async fn test_connected_host_is_not_reconnected() {
        let store = Arc::new(MetricsStore::new());
        let mut transport = MockTransport::new();
        transport.expect_open().times(1).returning(|_, _| Ok(healthy_shell()));
        let session = HostSession::new("up-1", Arc::new(transport), SessionOptions::default());
        let mut poller = MetricsPoller::new(vec![session], Arc::clone(&store), Duration::from_secs(5));
        let (_tx, rx) = watch::channel(false);

        for _ in 0..3 {
            poller.sweep(&rx).await;
        }
        assert!(poller.sessions()[0].is_connected());
    }

    #[tokio::test]
    async fn test_concurrent_mode_matches_serial() {
        let store = Arc::new(MetricsStore::new());
        let mut poller = poller(&["up-1", "down-1", "up-2"], &store).with_mode(PollMode::Concurrent);
        let (_tx, rx) = watch::channel(false);

        for _ in 0..3 {
            assert!(poller.sweep(&rx).await);
        }

        assert!(store.get("up-1").is_some());
        assert!(store.get("up-2").is_some());
        assert_eq!(store.status("down-1").state, ConnectionState::Blocked);
        assert_eq!(poller.sessions()[1].consecutive_failures(), 3);
    }

    #[tokio::test]
    async fn test_stop_before_sweep_touches_nothing() {
        let store = Arc::new(MetricsStore::new());
        let mut transport = MockTransport::new();
        transport.expect_open().never();
        let session = HostSession::new("up-1", Arc::new(transport), SessionOptions::default());
        let mut poller = MetricsPoller::new(vec![session], Arc::clone(&store), Duration::from_secs(5));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(!poller.sweep(&rx).await);
        assert!(store.last_sweep().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_pause() {
        let store = Arc::new(MetricsStore::new());
        let poller = MetricsPoller::new(
            poller(&["up-1"], &store).sessions,
            Arc::clone(&store),
            Duration::from_secs(3600),
        );
        let started = tokio::time::Instant::now();
        let handle = poller.spawn();

        // let the first sweep finish and the poller settle into its pause
        while store.last_sweep().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut sessions = handle.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(3600));
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_connected());

        for session in &mut sessions {
            session.disconnect().await;
        }
        assert!(!sessions[0].is_connected());
    }
}
