pub mod error;
pub mod hosts;
pub mod metrics;
pub mod poller;
pub mod session;
pub mod severity;
pub mod store;
pub mod transport;

pub use error::{HostListError, SessionError, TransportError};
pub use hosts::HostList;
pub use metrics::{HostMetrics, MetricCommand};
pub use poller::{MetricsPoller, PollMode, PollerHandle};
pub use session::{ConnectionState, HostSession, SessionOptions, SessionStatus};
pub use severity::{classify, Severity};
pub use store::{HostSnapshot, MetricsStore};
pub use transport::{RemoteShell, SshSettings, SshTransport, Transport};
