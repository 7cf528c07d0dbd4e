//! slamon-dash - terminal dashboard for the SLA monitoring agent
//!
//! Offers the four agent actions in a menu and streams the agent's
//! output into a log panel while a run is in progress.
//!
//! Usage:
//!   slamon-dash [OPTIONS]
//!
//! Examples:
//!   slamon-dash                          # Use the default database
//!   slamon-dash --db-path ./sla.db
//!   slamon-dash --config slamon.toml

mod colors;
mod panels;

use anyhow::{Context, Result};
use clap::Parser;
use colors::DashboardColors;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use panels::{MenuPanel, OutputLogPanel, StatusBar};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use slamon_core::{
    ChannelSink, ConfiguredAgentFactory, DashboardShell, OutputEvent, OutputSink, SlaConfig,
};
use std::{fs::OpenOptions, io, path::PathBuf, sync::Arc, sync::Mutex, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slamon-dash")]
#[command(about = "Terminal dashboard for the SLA monitoring agent")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path (overrides SLAMON_DB_PATH and the config file)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to `app.log_level`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log file; the terminal belongs to the UI
    #[arg(long)]
    log_file: Option<PathBuf>,
}

struct App {
    shell: DashboardShell,
    log: OutputLogPanel,
    sink: Arc<dyn OutputSink>,
    event_rx: mpsc::UnboundedReceiver<OutputEvent>,
    db_path: String,
    tick: usize,
}

impl App {
    fn new(config: SlaConfig) -> Self {
        let db_path = config.database.path.display().to_string();
        let (sink, event_rx) = ChannelSink::new();
        Self {
            shell: DashboardShell::new(Arc::new(ConfiguredAgentFactory::new(config))),
            log: OutputLogPanel::new(),
            sink: Arc::new(sink),
            event_rx,
            db_path,
            tick: 0,
        }
    }

    /// Drain everything delivered since the last frame
    fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.shell.observe(&event);
            self.log.push(&event);
        }
    }

    /// Returns true when the user asked to quit
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.shell.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.shell.select_next(),
            KeyCode::Enter | KeyCode::Char('r') => {
                let action = self.shell.selected();
                if self.shell.trigger(self.sink.clone()).is_some() {
                    info!("Started {}", action.label());
                    self.log.scroll_to_bottom();
                }
            }
            KeyCode::Char('c') => self.log.clear(),
            KeyCode::PageUp => self.log.scroll_up(10),
            KeyCode::PageDown => self.log.scroll_down(10),
            KeyCode::End => self.log.scroll_to_bottom(),
            _ => {}
        }
        false
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = SlaConfig::load(args.config.as_deref())?;
    if let Some(path) = args.db_path {
        config.database.path = path;
    }
    let level = config.app.effective_log_level(args.log_level.as_deref());

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("slamon-dash.log"));
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;

    let filter = EnvFilter::new(format!(
        "slamon_dash={lvl},slamon_core={lvl},libsql=warn",
        lvl = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    debug!("Dashboard v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Database: {}", config.database.path.display());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("Error: {:?}", err);
        return Err(err);
    }

    debug!("Dashboard exiting cleanly");
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.process_events();

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(1),
                ])
                .split(f.area());

            let header = Paragraph::new(format!("SLA Monitoring Agent  [{}]", app.db_path))
                .style(
                    Style::default()
                        .fg(DashboardColors::HEADER)
                        .add_modifier(Modifier::BOLD),
                )
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(DashboardColors::BORDER)),
                );
            f.render_widget(header, chunks[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(28), Constraint::Min(20)])
                .split(chunks[1]);

            MenuPanel::render(f, body[0], &app.shell);
            app.log.render(f, body[1]);
            StatusBar::render(f, chunks[2], app.shell.state(), app.tick);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                    break;
                }
            }
        }

        app.tick = app.tick.wrapping_add(1);
    }

    Ok(())
}
