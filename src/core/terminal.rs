//! Terminal setup and the dispatch loop for fe.
//!
//! Handles setup/teardown of raw mode and the alternate screen, and runs the single dispatch
//! loop that applies key presses, timer expiries, watcher failures and redraw requests to the
//! [AppState] in the order they arrive.

use crate::app::AppState;
use crate::core::worker::{EventSource, spawn_event_poller};
use crate::ui;

use anyhow::Context;
use crossbeam_channel::{bounded, select, tick};
use crossterm::{
    cursor::{Hide, Show},
    event::{Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::io;
use std::time::Duration;

/// Upper bound on how long the loop sleeps without checking the dirty flag.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Initializes the terminal in raw mode and alternate screen and runs the dispatch loop.
///
/// Blocks until quit. The terminal is restored before returning, also when the loop failed.
pub fn run_terminal<S: EventSource>(app: &mut AppState, source: S) -> anyhow::Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide).context("entering alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout)).context("initializing terminal")?;

    let result = event_loop(&mut terminal, app, source);

    let restored = disable_raw_mode()
        .and_then(|()| execute!(terminal.backend_mut(), LeaveAlternateScreen, Show))
        .context("restoring terminal");
    result.and(restored)
}

/// The dispatch loop: draws when dirty, then waits for the next message.
///
/// Returns when the quit signal triggers or the input source closes. A fatal error from a
/// worker or a builtin action is returned as is. Either way the workers are stopped first.
pub fn event_loop<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    source: S,
) -> anyhow::Result<()>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
    S: EventSource,
{
    let (event_tx, event_rx) = bounded::<Event>(0);
    let poller = spawn_event_poller(source, event_tx, app.quit_listener());

    let result = dispatch(terminal, app, &event_rx);

    app.shutdown();
    drop(event_rx);
    if poller.join().is_err() {
        log::error!("event poller panicked");
    }
    result
}

fn dispatch<B>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    event_rx: &crossbeam_channel::Receiver<Event>,
) -> anyhow::Result<()>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let ticker = tick(TICK_INTERVAL);
    let refresh_rx = app.refresh_rx().clone();
    let timer_rx = app.timer_rx().clone();
    let fatal_rx = app.fatal_rx().clone();
    let quit_rx = app.quit_listener();

    loop {
        if app.is_quitting() {
            return Ok(());
        }

        if app.take_dirty() {
            terminal
                .draw(|f| ui::render(f, app))
                .context("drawing frame")?;
        }

        select! {
            recv(event_rx) -> ev => match ev {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key)?,
                Ok(Event::Resize(_, _)) => {
                    terminal.clear().context("clearing terminal")?;
                    app.mark_dirty();
                }
                Ok(_) => {}
                Err(_) => {
                    log::info!("input closed, leaving");
                    return Ok(());
                }
            },
            recv(timer_rx) -> ev => {
                if let Ok(ev) = ev {
                    app.handle_timer(ev);
                }
            }
            recv(fatal_rx) -> err => {
                if let Ok(err) = err {
                    return Err(err);
                }
            }
            recv(refresh_rx) -> _ => {}
            recv(quit_rx) -> _ => {}
            recv(ticker) -> _ => {}
        }
    }
}
