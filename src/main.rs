mod audio;
mod auth;
mod controller;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::Mutex;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use audio::{AudioBackend, NullTransport, Transport};
use auth::TokenStore;
use controller::AppController;
use model::{ApiClient, AppModel, PlayerCore, Session, SessionPhase};
use view::AppView;

const DEFAULT_SERVER: &str = "http://localhost:8000";

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Cadence Client Starting ===");

    let base_url =
        std::env::var("CADENCE_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
    tracing::info!(server = %base_url, "Using music server");

    let api = ApiClient::new(&base_url)
        .map_err(|e| anyhow::anyhow!("API client init failed: {}", e))?;
    let session = Session::new(api.clone(), TokenStore::new());

    // Step 1: resolve any stored credential before entering the TUI
    session.bootstrap().await;

    // Step 2: bring up the audio transport. Fall back to a silent transport
    // when no output device is available so browsing still works.
    let mut audio_error = None;
    let (transport, transport_events): (Box<dyn Transport>, _) =
        match AudioBackend::new(api.token_cell()) {
            Ok(backend) => {
                let events = backend.subscribe();
                (Box::new(backend), Some(events))
            }
            Err(e) => {
                tracing::error!(error = %e, "Audio init failed, running without playback");
                audio_error = Some(format!("Audio init failed: {}", e));
                (Box::new(NullTransport), None)
            }
        };

    let player = PlayerCore::new(transport, base_url.clone());
    let mut app_model = AppModel::new(player);
    app_model.set_session(session.clone());

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let model = Arc::new(Mutex::new(app_model));
    let controller = AppController::new(model.clone());

    if let Some(events) = transport_events {
        controller.start_transport_event_listener(events);
    }

    if let Some(message) = audio_error {
        model.lock().await.set_error(message).await;
    }

    // A restored session can fetch content right away; otherwise the auth
    // screen does it after login.
    if session.phase().await == SessionPhase::Authenticated {
        let controller_for_init = controller.clone();
        tokio::spawn(async move {
            controller_for_init.load_initial_content().await;
        });
    }

    let res = run_app(&mut terminal, model.clone(), controller, session).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Cadence client shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
    session: Session,
) -> io::Result<()> {
    // Track when we last checked the token
    let mut last_token_check = std::time::Instant::now();
    const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(600);

    loop {
        // Periodically refresh the access token. Concurrent checks coalesce
        // into a single request inside the API client.
        if last_token_check.elapsed() >= TOKEN_CHECK_INTERVAL {
            last_token_check = std::time::Instant::now();

            if session.phase().await == SessionPhase::Authenticated {
                let session_for_refresh = session.clone();
                tokio::spawn(async move {
                    if let Err(e) = session_for_refresh.refresh_token().await {
                        tracing::warn!("Token refresh check failed: {}", e);
                    }
                });
            }
        }

        // Get current state
        let (session_state, playback, queue, ui_state, content_state, should_quit) = {
            let model_guard = model.lock().await;

            // Auto-clear old errors (after 5 seconds)
            model_guard.auto_clear_old_errors().await;

            let (queue, _) = model_guard.get_queue_snapshot().await;
            (
                session.snapshot().await,
                model_guard.get_playback_info().await,
                queue,
                model_guard.get_ui_state().await,
                model_guard.get_content_state().await,
                model_guard.should_quit().await,
            )
        };

        // Draw UI
        terminal.draw(|f| {
            AppView::render(f, &session_state, &playback, &queue, &ui_state, &content_state);
        })?;

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Errors are surfaced through the model, nothing to do here
                let _ = controller.handle_key_event(key).await;
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
