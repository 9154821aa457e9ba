/// CLI argument parsing

use clap::Parser;
use std::ffi::OsString;

#[derive(Parser, Debug)]
#[command(name = "server-check")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "server-check                 Run the monitoring dashboard\n       \
                            server-check --add <HOST>    Add a host to monitor\n       \
                            server-check --remove <HOST> Remove a host")]
pub struct Cli {
    /// Add a host to the list (hostname, address or user@host)
    #[arg(long, value_name = "HOST", conflicts_with = "remove")]
    pub add: Option<String>,

    /// Remove a host from the list
    #[arg(long, value_name = "HOST")]
    pub remove: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dashboard,
    Add(String),
    Remove(String),
}

impl Cli {
    pub fn into_action(self) -> Action {
        match (self.add, self.remove) {
            (Some(host), _) => Action::Add(host),
            (None, Some(host)) => Action::Remove(host),
            (None, None) => Action::Dashboard,
        }
    }
}

/// Parse process arguments into an action.
///
/// `--help` and `--version` come back as errors too; check
/// [`clap::Error::use_stderr`] to tell them from real mistakes.
pub fn parse_args<I, T>(args: I) -> Result<Action, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map(Cli::into_action)
}
