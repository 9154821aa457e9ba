/// Main TUI application

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::{HostSession, MetricsPoller, MetricsStore, SshTransport, Transport};
use crate::screens::Dashboard;
use crate::utils::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    Quit,
    /// Draw the next frame now instead of waiting out the display period
    Redraw,
}

/// Source of user input for the dashboard loop
pub trait InputSource {
    /// Wait up to `timeout` for input
    fn poll(&mut self, timeout: Duration) -> Result<Option<UserInput>>;
}

/// Crossterm keyboard and terminal events
pub struct KeyboardInput;

impl KeyboardInput {
    fn map_key(key: KeyEvent) -> Option<UserInput> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(UserInput::Quit),
            // raw mode swallows SIGINT
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(UserInput::Quit),
            _ => None,
        }
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self, timeout: Duration) -> Result<Option<UserInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(key) => Self::map_key(key),
            Event::Resize(..) => Some(UserInput::Redraw),
            _ => None,
        })
    }
}

pub struct App {
    hosts: Vec<String>,
    config: AppConfig,
    dashboard: Dashboard,
}

impl App {
    pub fn new(hosts: Vec<String>, config: AppConfig) -> Self {
        Self {
            hosts,
            config,
            dashboard: Dashboard::new(),
        }
    }

    /// Run the dashboard until the user quits.
    ///
    /// Must be called from a multi-threaded runtime: the draw loop blocks its
    /// worker while the poller runs on the others.
    pub async fn run(&mut self) -> Result<()> {
        let transport = SshTransport::new(self.config.ssh.clone()).context("Failed to prepare SSH control directory")?;
        let transport: Arc<dyn Transport> = Arc::new(transport);

        let options = self.config.session_options();
        let sessions = self
            .hosts
            .iter()
            .map(|host| HostSession::new(host.clone(), Arc::clone(&transport), options))
            .collect();
        let store = Arc::new(MetricsStore::new());

        // Setup terminal
        let mut terminal = setup_terminal()?;

        let poller = MetricsPoller::new(sessions, Arc::clone(&store), self.config.refresh_interval())
            .with_mode(self.config.poll_mode)
            .spawn();

        let result = tokio::task::block_in_place(|| self.run_loop(&mut terminal, &store, &mut KeyboardInput));
        if let Err(e) = &result {
            warn!(error = %e, "Dashboard loop failed");
        }

        let mut sessions = poller.shutdown().await;
        for session in &mut sessions {
            session.disconnect().await;
        }
        info!(hosts = sessions.len(), "Sessions closed");

        // Restore terminal
        let restored = restore_terminal(&mut terminal);
        result.and(restored)
    }

    /// Draw a frame, then wait out the display period in key-poll steps
    pub fn run_loop<B: Backend, I: InputSource>(
        &self,
        terminal: &mut Terminal<B>,
        store: &MetricsStore,
        input: &mut I,
    ) -> Result<()> {
        let display_period = self.config.display_period();
        let key_poll = self.config.key_poll();

        loop {
            let rows = store.snapshot(&self.hosts);
            let last_sweep = store.last_sweep();
            terminal.draw(|f| self.dashboard.render(f, &rows, last_sweep))?;

            let frame_started = Instant::now();
            while let Some(remaining) = display_period.checked_sub(frame_started.elapsed()) {
                match input.poll(remaining.min(key_poll))? {
                    Some(UserInput::Quit) => {
                        info!("Quit requested");
                        return Ok(());
                    }
                    Some(UserInput::Redraw) => break,
                    None => {}
                }
            }
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    let setup = execute!(stdout, EnterAlternateScreen)
        .map_err(anyhow::Error::from)
        .and_then(|_| Terminal::new(CrosstermBackend::new(stdout)).map_err(anyhow::Error::from));

    match setup {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            Err(e.context("Failed to set up terminal"))
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
