/// Shared metrics store between the poller and the dashboard
///
/// Snapshots are stored as `Arc<HostMetrics>` and replaced whole, so a reader
/// holding one can never see fields from two different fetches. The lock is
/// only held for map lookups and pointer swaps.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::metrics::HostMetrics;
use super::session::SessionStatus;

/// Everything the dashboard needs for one host row
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub host: String,
    pub status: SessionStatus,
    pub metrics: Option<Arc<HostMetrics>>,
}

#[derive(Default)]
struct Inner {
    metrics: HashMap<String, Arc<HostMetrics>>,
    status: HashMap<String, SessionStatus>,
    last_sweep: Option<DateTime<Local>>,
}

#[derive(Default)]
pub struct MetricsStore {
    inner: Mutex<Inner>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a panicking writer cannot leave a half-written snapshot behind
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the latest metrics for a host
    pub fn set(&self, host: &str, metrics: HostMetrics) {
        let snapshot = Arc::new(metrics);
        self.lock().metrics.insert(host.to_string(), snapshot);
    }

    /// Latest metrics for a host, if any fetch has succeeded yet
    pub fn get(&self, host: &str) -> Option<Arc<HostMetrics>> {
        self.lock().metrics.get(host).cloned()
    }

    pub fn set_status(&self, host: &str, status: SessionStatus) {
        self.lock().status.insert(host.to_string(), status);
    }

    /// Connection status as last reported by the poller
    pub fn status(&self, host: &str) -> SessionStatus {
        self.lock().status.get(host).copied().unwrap_or_default()
    }

    pub fn mark_sweep(&self, at: DateTime<Local>) {
        self.lock().last_sweep = Some(at);
    }

    pub fn last_sweep(&self) -> Option<DateTime<Local>> {
        self.lock().last_sweep
    }

    /// Copy out the rows for `hosts`, in order, under a single lock
    pub fn snapshot(&self, hosts: &[String]) -> Vec<HostSnapshot> {
        let inner = self.lock();
        hosts
            .iter()
            .map(|host| HostSnapshot {
                host: host.clone(),
                status: inner.status.get(host).copied().unwrap_or_default(),
                metrics: inner.metrics.get(host).cloned(),
            })
            .collect()
    }
}
