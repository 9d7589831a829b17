//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background events, model failures and a
//! periodic tick.

use crate::app::{App, AppEvent};
use crate::entries::CommandFailure;
use anyhow::Result;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::input::handle_input;
use super::render::render;

/// Number of frames in the progress spinner.
pub(super) const SPINNER_FRAMES: usize = 10;

/// Result of handling a key press.
pub enum Action {
    Continue,
    Quit,
}

/// Runs the TUI until the user quits or a termination signal arrives.
///
/// The `tokio::select!` sources, in priority order:
/// - **Signals**: SIGTERM / SIGINT (Unix only)
/// - **Terminal input**: crossterm's async event stream
/// - **Background events**: list states, feed and entry loads
/// - **Failures**: commands that failed inside a model
/// - **Tick**: 250ms, expires the undo window and status messages, and
///   starts a search once typing pauses
///
/// On exit the current list is committed and its model flushed before the
/// terminal is restored.
///
/// # Errors
///
/// Returns an error if the terminal cannot be put into or taken out of raw
/// mode, or if drawing a frame fails.
pub async fn run(
    app: &mut App,
    mut event_rx: mpsc::UnboundedReceiver<AppEvent>,
    mut failure_rx: mpsc::UnboundedReceiver<CommandFailure>,
) -> Result<()> {
    // Restore the terminal before the default hook prints the panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Drain pending events so rapid input cannot starve list updates
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.needs_redraw = true;
                    if let Action::Quit = handle_input(app, key.code, key.modifiers) {
                        break;
                    }
                }
                Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Terminal event stream failed");
                    break;
                }
                None => break,
            },

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event);
            }

            Some(failure) = failure_rx.recv() => {
                app.on_failure(failure);
            }

            _ = tick_interval.tick() => {
                handle_tick(app);
            }
        }
    }

    app.shutdown().await;
    restore_terminal(terminal)?;
    Ok(())
}

fn handle_tick(app: &mut App) {
    if app.clear_expired_status() {
        app.needs_redraw = true;
    }
    if app.screen_mut().is_some_and(|s| s.expire_undo()) {
        tracing::trace!("Undo window expired");
        app.needs_redraw = true;
    }
    if app.run_debounced_search() {
        app.needs_redraw = true;
    }
    if app.is_busy() {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER_FRAMES;
        app.needs_redraw = true;
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
