//! Terminal UI for coleta that lets users pick a region, filter categories and browse collection points.

mod app;
mod input;
mod location;
mod settings;
mod ui;

use std::{fs::File, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use coleta_core::service::ColetaService;
use coleta_provider_catalog as catalog;
use coleta_provider_ibge as ibge;

use crate::app::{App, Message};
use crate::input::Action;
use crate::location::ConfiguredLocation;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; settings fall back to defaults.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("failed to read .env");
        }
    }
    let settings = Settings::load().context("failed to load settings")?;
    init_logging(&settings)?;

    tracing::info!(
        geo = %settings.geo_base_url,
        api = %settings.api_base_url,
        "starting coleta"
    );

    // HTTP + service setup
    let client = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .build()?;

    let service = ColetaService::new(
        ibge::port(client.clone(), settings.geo_base_url.as_str()),
        catalog::port(client, settings.api_base_url.as_str()),
        Arc::new(ConfiguredLocation::from_settings(&settings)?),
    )
    .with_timeout(settings.request_timeout());

    // App state
    let (mut app, rx) = App::new(Arc::new(service));
    app.mount_home();

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    tracing::info!("coleta stopped");
    res
}

fn init_logging(settings: &Settings) -> Result<()> {
    // stdout belongs to the terminal UI, so logs go to a file.
    let file = File::create(&settings.log_file)
        .with_context(|| format!("cannot create log file {}", settings.log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    mut rx: UnboundedReceiver<Message>,
) -> Result<()> {
    loop {
        // Apply finished lookups before drawing
        while let Ok(message) = rx.try_recv() {
            app.apply(message);
        }

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout so results show up promptly)
        if event::poll(StdDuration::from_millis(50))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                action => input::perform(action, &mut app),
            }
        }
    }

    Ok(())
}
