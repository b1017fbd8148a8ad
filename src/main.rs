use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod app;
mod handler;
mod session;
mod tui;
mod ui;

use api::ChatClient;
use app::App;
use tui::EventHandler;

/// Diagnostics go to a file; the terminal itself belongs to the TUI.
/// Logging is best-effort: if the file cannot be created we run without it.
fn init_logging() {
    let path = std::env::temp_dir().join("studybot-tui.log");
    let Ok(log_file) = std::fs::File::create(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(ChatClient::new(api::API_URL));

    tracing::info!(session_id = %app.session_id, "studybot session started");

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        } else {
            // Event channel closed; nothing more can happen
            break;
        }
    }
    Ok(())
}
