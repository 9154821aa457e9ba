/// Remote shell transport
///
/// [`Transport`] opens a connection to a host and hands back a [`RemoteShell`]
/// that runs commands over it. [`SshTransport`] drives the system OpenSSH
/// client with connection multiplexing: `open` starts a persistent control
/// master, `run` reuses it, `close` tells the master to exit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::process::Command;

use super::error::TransportError;
use crate::utils::APP_NAME;

/// Opens remote shells
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and authenticate, giving up after `timeout`
    async fn open(&self, host: &str, timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError>;
}

/// An established connection able to run commands
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run a command and return its stdout
    async fn run(&self, command: &str) -> Result<String, TransportError>;

    /// Release the connection. Must be safe to call more than once.
    async fn close(&mut self);
}

/// OpenSSH client options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// ssh executable
    pub binary: String,
    /// Login name, unless the host entry is `user@host`
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=accept-new`
    pub extra_options: Vec<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            user: None,
            port: None,
            identity_file: None,
            extra_options: Vec::new(),
        }
    }
}

impl SshSettings {
    /// Arguments shared by every ssh invocation for one control socket
    fn common_args(&self, control_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", control_path.display()),
        ];

        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }

        if let Some(ref identity) = self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }

        if let Some(ref user) = self.user {
            args.push("-l".to_string());
            args.push(user.clone());
        }

        for option in &self.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }

        args
    }
}

/// Transport backed by the `ssh` binary
pub struct SshTransport {
    settings: SshSettings,
    control_dir: PathBuf,
    next_socket: AtomicUsize,
}

impl SshTransport {
    /// Create a transport keeping its control sockets in a private per-process directory
    pub fn new(settings: SshSettings) -> std::io::Result<Self> {
        let control_dir = std::env::temp_dir().join(format!("{}-{}", APP_NAME, std::process::id()));
        std::fs::create_dir_all(&control_dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&control_dir, std::fs::Permissions::from_mode(0o700))?;
        }

        Ok(Self {
            settings,
            control_dir,
            next_socket: AtomicUsize::new(0),
        })
    }

    fn control_path(&self) -> PathBuf {
        // kept short, unix socket paths are limited to ~100 bytes
        let n = self.next_socket.fetch_add(1, Ordering::Relaxed);
        self.control_dir.join(format!("cm-{n}"))
    }
}

impl Drop for SshTransport {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.control_dir);
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn open(&self, host: &str, timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError> {
        let control_path = self.control_path();
        let args = self.settings.common_args(&control_path);

        let mut cmd = Command::new(&self.settings.binary);
        cmd.args(&args)
            .arg("-o")
            .arg("ControlMaster=auto")
            .arg("-o")
            .arg("ControlPersist=yes")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", timeout.as_secs().max(1)))
            .arg(host)
            .arg("true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(Box::new(SshShell {
                binary: self.settings.binary.clone(),
                host: host.to_string(),
                args,
                closed: false,
            })),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(TransportError::Connect {
                    host: host.to_string(),
                    reason: format!("ssh exited with {}: {}", output.status, stderr.trim()),
                })
            }
            Ok(Err(e)) => Err(TransportError::Connect {
                host: host.to_string(),
                reason: format!("failed to launch {}: {e}", self.settings.binary),
            }),
            Err(_) => Err(TransportError::ConnectTimeout {
                host: host.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }
}

/// Shell multiplexed over an ssh control master
struct SshShell {
    binary: String,
    host: String,
    args: Vec<String>,
    closed: bool,
}

impl SshShell {
    fn exit_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.binary);
        cmd.args(&self.args)
            .arg("-O")
            .arg("exit")
            .arg(&self.host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn run(&self, command: &str) -> Result<String, TransportError> {
        let output = Command::new(&self.binary)
            .args(&self.args)
            .arg("-o")
            .arg("ControlMaster=no")
            .arg(&self.host)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TransportError::ChannelOpen(e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TransportError::Exec(format!("exit {}: {}", output.status, stderr.trim())))
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let status = Command::from(self.exit_command()).status().await;
        if let Err(e) = status {
            tracing::debug!(host = %self.host, error = %e, "Failed to stop ssh control master");
        }
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        // fallback for shells dropped without close(), e.g. on panic
        if !self.closed {
            let _ = self.exit_command().spawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_args_minimal() {
        let settings = SshSettings::default();
        let args = settings.common_args(Path::new("/tmp/sc/cm-0"));

        assert_eq!(
            args,
            vec!["-o", "BatchMode=yes", "-o", "ControlPath=/tmp/sc/cm-0"]
        );
    }

    #[test]
    fn test_common_args_full() {
        let settings = SshSettings {
            binary: "ssh".into(),
            user: Some("ops".into()),
            port: Some(2222),
            identity_file: Some(PathBuf::from("/home/ops/.ssh/id_ed25519")),
            extra_options: vec!["StrictHostKeyChecking=accept-new".into()],
        };
        let args = settings.common_args(Path::new("/tmp/sc/cm-1"));
        let joined = args.join(" ");

        assert!(joined.contains("-p 2222"));
        assert!(joined.contains("-i /home/ops/.ssh/id_ed25519"));
        assert!(joined.contains("-l ops"));
        assert!(joined.ends_with("-o StrictHostKeyChecking=accept-new"));
    }

    #[test]
    fn test_control_paths_are_unique() {
        let transport = SshTransport::new(SshSettings::default()).unwrap();
        let a = transport.control_path();
        let b = transport.control_path();

        assert_ne!(a, b);
        assert!(a.starts_with(&transport.control_dir));
    }

    #[tokio::test]
    async fn test_missing_binary_is_connect_failure() {
        let transport = SshTransport::new(SshSettings {
            binary: "/nonexistent/ssh-binary".into(),
            ..SshSettings::default()
        })
        .unwrap();

        let err = transport
            .open("example.invalid", Duration::from_secs(1))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(err.to_string().contains("failed to launch"));
    }
}
