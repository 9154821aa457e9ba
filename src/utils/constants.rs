/// Server Check constants
///
/// Fixed polling policy, severity thresholds and dashboard column layout

/// Application name, also the directory name under `~/.config`
pub const APP_NAME: &str = "server-check";

/// Host list file inside the config directory
pub const HOSTS_FILE: &str = "hosts.txt";

/// Optional settings file inside the config directory
pub const SETTINGS_FILE: &str = "config.toml";

/// Default log file inside the config directory
pub const LOG_FILE: &str = "server-check.log";

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "SERVER_CHECK_LOG";

/// Consecutive connect failures after which a host is blocked for the process lifetime
pub const MAX_CONNECT_FAILURES: u32 = 3;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DISPLAY_PERIOD_SECS: u64 = 5;
pub const DEFAULT_KEY_POLL_MILLIS: u64 = 100;

/// Values strictly above this are red
pub const THRESHOLD_RED: f64 = 80.0;
/// Values strictly above this (and not red) are yellow
pub const THRESHOLD_YELLOW: f64 = 50.0;

pub const TITLE: &str = "Server Check - Press 'Q' or 'q' to quit.";
pub const CONNECTING_TEXT: &str = "Connecting...";
pub const FAILED_TEXT: &str = "Connection Failed";
pub const PLACEHOLDER_TEXT: &str = "-";

/// Dashboard table column
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: u16,
}

pub const COL_HOST: Column = Column { title: "Host", width: 20 };
pub const COL_CPU_TYPE: Column = Column { title: "CPU Type", width: 25 };
pub const COL_CPU_UTIL: Column = Column { title: "CPU Util", width: 15 };
pub const COL_RAM_USAGE: Column = Column { title: "RAM Usage (%)", width: 30 };
pub const COL_DISK_USAGE: Column = Column { title: "Disk Usage", width: 20 };

pub const COLUMNS: [Column; 5] = [COL_HOST, COL_CPU_TYPE, COL_CPU_UTIL, COL_RAM_USAGE, COL_DISK_USAGE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ordered() {
        assert!(THRESHOLD_YELLOW < THRESHOLD_RED);
    }

    #[test]
    fn test_column_titles_fit() {
        for column in COLUMNS {
            assert!(column.title.len() <= column.width as usize, "{} overflows", column.title);
        }
    }

    #[test]
    fn test_display_period_covers_key_polls() {
        assert_eq!(DEFAULT_DISPLAY_PERIOD_SECS * 1000 / DEFAULT_KEY_POLL_MILLIS, 50);
    }
}
