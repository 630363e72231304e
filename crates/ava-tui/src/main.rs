use std::sync::Arc;
use anyhow::Result;
use ava_core::{check_session, ChatApiClient, Config};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("Could not read config, using defaults: {}", err);
        Config::new()
    });

    match logging::init(&config) {
        Ok(path) => log::info!("[main] logging to {}", path.display()),
        Err(err) => eprintln!("Logging disabled: {}", err),
    }

    let api = Arc::new(ChatApiClient::new(
        &config.base_url,
        config.session_cookie.as_deref(),
    )?);
    log::info!("[main] chat backend at {}", api.base_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, App::new(config), api).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, mut app: App, api: Arc<ChatApiClient>) -> Result<()> {
    let mut events = EventHandler::new();

    // The session is checked exactly once
    let tx = events.sender();
    let session_api = api.clone();
    tokio::spawn(async move {
        let result = check_session(session_api.as_ref()).await;
        let _ = tx.send(AppEvent::Session(result));
    });

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(&mut app, event)?;

        for request in app.take_requests() {
            log::debug!("[main] dispatching {:?}", request);
            let tx = events.sender();
            let api = api.clone();
            tokio::spawn(async move {
                let outcome = request.execute(api.as_ref()).await;
                let _ = tx.send(AppEvent::Chat(outcome));
            });
        }
    }

    Ok(())
}
