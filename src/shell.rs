//! Terminal shell hosting one chat widget
//!
//! Owns the terminal, mounts the widget, forwards key presses and redraws on
//! every state change. A crashed widget task is caught here and replaced by a
//! fallback screen until the user reloads.

mod app;
mod view;

use crate::runtime::{mount, ChannelFactory, WidgetExit};
use crate::state_machine::WidgetContext;
use app::{Action, App};
use crossterm::event::{self, Event as TermEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_millis(120);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Restores the terminal when dropped, including on early return
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let guard = Self;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok((guard, terminal))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Read terminal events on a blocking thread until stopped
fn spawn_input_reader(
    tx: mpsc::Sender<TermEvent>,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read terminal event");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Failed to poll terminal");
                    break;
                }
            }
        }
    })
}

/// Run the chat UI until the user quits
pub async fn run<F>(context: &WidgetContext, factory: &F) -> io::Result<()>
where
    F: ChannelFactory + Clone + 'static,
{
    let (guard, mut terminal) = TerminalGuard::enter()?;

    let stop = CancellationToken::new();
    let (input_tx, mut input_rx) = mpsc::channel(64);
    let reader = spawn_input_reader(input_tx, stop.clone());

    let mut widget = mount(context.clone(), factory.clone());
    let mut state_rx = widget.subscribe();
    let mut state_open = true;
    let mut app = App::default();
    let mut ticker = tokio::time::interval(TICK);

    let result = loop {
        if app.crashed().is_none() {
            if let Some(WidgetExit::Crashed(reason)) = widget.exited().await {
                tracing::error!(reason = %reason, "Chat widget crashed");
                app.crash(reason);
            }
        }

        let state = state_rx.borrow().clone();
        if let Err(e) = terminal.draw(|frame| view::draw(frame, &app, &state)) {
            break Err(e);
        }

        let action = tokio::select! {
            _ = ticker.tick() => {
                app.on_tick();
                Action::None
            }
            changed = state_rx.changed(), if state_open => {
                if changed.is_err() {
                    state_open = false;
                }
                Action::None
            }
            input = input_rx.recv() => match input {
                Some(TermEvent::Key(key)) => app.handle_key(key, &state),
                Some(_) => Action::None,
                None => Action::Quit,
            },
        };

        match action {
            Action::None => {}
            Action::Submit(text) => {
                if let Err(e) = widget.submit(text).await {
                    tracing::error!(error = %e, "Failed to submit message");
                }
            }
            Action::Reload => {
                tracing::info!("Reloading chat widget");
                widget.unmount().await;
                widget = mount(context.clone(), factory.clone());
                state_rx = widget.subscribe();
                state_open = true;
                app = App::default();
            }
            Action::Quit => break Ok(()),
        }
    };

    widget.unmount().await;
    stop.cancel();
    let _ = reader.await;
    drop(guard);
    result
}
