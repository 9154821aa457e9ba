use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use server_check::app::App;
use server_check::cli::{self, Action};
use server_check::core::{HostList, HostListError};
use server_check::utils::{init_logging, AppConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let action = match cli::parse_args(std::env::args_os()) {
        Ok(action) => action,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    match run(action).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(action: Action) -> Result<ExitCode> {
    match action {
        Action::Add(host) => handle_add(&host),
        Action::Remove(host) => handle_remove(&host),
        Action::Dashboard => handle_dashboard().await,
    }
}

fn handle_add(host: &str) -> Result<ExitCode> {
    let mut hosts = HostList::load_default()?;

    match hosts.add(host) {
        Ok(()) => println!("{}", format!("Successfully added host: {}", host).green()),
        Err(e @ HostListError::Duplicate(_)) => eprintln!("{}", e.to_string().yellow()),
        Err(e) => return Err(e.into()),
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_remove(host: &str) -> Result<ExitCode> {
    let mut hosts = HostList::load_default()?;

    match hosts.remove(host) {
        Ok(()) => println!("{}", format!("Successfully removed host: {}", host).green()),
        Err(e @ HostListError::NotFound(_)) => eprintln!("{}", e.to_string().yellow()),
        Err(e) => return Err(e.into()),
    }

    Ok(ExitCode::SUCCESS)
}

async fn handle_dashboard() -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let hosts = HostList::load_default()?;

    if hosts.is_empty() {
        println!("No hosts configured. Use 'server-check --add <host>' to add some.");
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(&config)?;

    let mut app = App::new(hosts.hosts().to_vec(), config);
    app.run().await?;

    Ok(ExitCode::SUCCESS)
}
