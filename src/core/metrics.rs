/// Host metrics and the remote commands that produce them
///
/// Every field is an already formatted display string as printed by the
/// remote command. Nothing here parses numbers; severity is derived later by
/// [`crate::core::severity::classify`].

use std::time::Duration;

use super::error::TransportError;
use super::transport::RemoteShell;
use crate::utils::strip_line_endings;

/// The four fixed remote commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCommand {
    CpuModel,
    RamUsage,
    DiskUsage,
    CpuUtilization,
}

impl MetricCommand {
    pub const ALL: [MetricCommand; 4] = [
        MetricCommand::CpuModel,
        MetricCommand::RamUsage,
        MetricCommand::DiskUsage,
        MetricCommand::CpuUtilization,
    ];

    /// Shell command line executed on the remote host
    pub fn command_line(&self) -> &'static str {
        match self {
            MetricCommand::CpuModel => {
                "lscpu | grep 'Model name:' | awk -F ':' '{print $2}' | xargs"
            }
            MetricCommand::RamUsage => {
                "free -m | awk 'NR==2{printf \"%.2fGB/%.2fGB (%.2f%%)\", $3/1024, $2/1024, $3*100/$2}'"
            }
            MetricCommand::DiskUsage => {
                "df -h / | awk 'NR==2{printf \"%s/%s (%s)\", $3, $2, $5}'"
            }
            MetricCommand::CpuUtilization => {
                "top -bn1 | grep 'Cpu(s)' | sed 's/.*, *\\([0-9.]*\\)%* id.*/\\1/' | awk '{print 100 - $1\"%\"}'"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricCommand::CpuModel => "cpu_type",
            MetricCommand::RamUsage => "ram_info",
            MetricCommand::DiskUsage => "disk_info",
            MetricCommand::CpuUtilization => "cpu_utilization",
        }
    }
}

/// Latest readings for one host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMetrics {
    pub cpu_type: String,
    pub ram_info: String,
    pub disk_info: String,
    pub cpu_utilization: String,
}

impl HostMetrics {
    pub fn field(&self, command: MetricCommand) -> &str {
        match command {
            MetricCommand::CpuModel => &self.cpu_type,
            MetricCommand::RamUsage => &self.ram_info,
            MetricCommand::DiskUsage => &self.disk_info,
            MetricCommand::CpuUtilization => &self.cpu_utilization,
        }
    }
}

/// Run all four commands over `shell`.
///
/// Each command is independent: a failure or timeout is recorded as an
/// `Error: ...` string in that field and the other fields are still filled.
pub async fn collect(shell: &dyn RemoteShell, host: &str, timeout: Duration) -> HostMetrics {
    let (cpu_type, ram_info, disk_info, cpu_utilization) = tokio::join!(
        run_field(shell, host, MetricCommand::CpuModel, timeout),
        run_field(shell, host, MetricCommand::RamUsage, timeout),
        run_field(shell, host, MetricCommand::DiskUsage, timeout),
        run_field(shell, host, MetricCommand::CpuUtilization, timeout),
    );

    HostMetrics {
        cpu_type,
        ram_info,
        disk_info,
        cpu_utilization,
    }
}

async fn run_field(shell: &dyn RemoteShell, host: &str, command: MetricCommand, timeout: Duration) -> String {
    let result = match tokio::time::timeout(timeout, shell.run(command.command_line())).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::CommandTimeout(timeout.as_secs())),
    };

    match result {
        Ok(output) => strip_line_endings(&output),
        Err(e) => {
            tracing::debug!(host, field = command.label(), error = %e, "Metric command failed");
            e.field_text().to_string()
        }
    }
}
