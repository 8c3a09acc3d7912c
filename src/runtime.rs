//! Runtime for mounted chat widgets
//!
//! A mounted widget is one tokio task running [`WidgetRuntime`]; the shell
//! talks to it through a [`WidgetHandle`].

mod executor;
pub mod traits;


pub use executor::WidgetRuntime;
pub use traits::*;

use crate::state_machine::{Event, WidgetContext, WidgetState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to interact with a mounted widget.
///
/// Dropping the handle unmounts the widget.
pub struct WidgetHandle {
    event_tx: mpsc::Sender<Event>,
    state_rx: watch::Receiver<WidgetState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// How a widget task stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetExit {
    Unmounted,
    /// The task panicked; carries the panic message when there is one
    Crashed(String),
}

/// Mount a widget: spawn its runtime and return the handle
pub fn mount<F>(context: WidgetContext, factory: F) -> WidgetHandle
where
    F: ChannelFactory + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(64);
    let (state_tx, state_rx) = watch::channel(WidgetState::default());
    let shutdown = CancellationToken::new();

    let runtime = WidgetRuntime::new(
        context,
        factory,
        event_rx,
        event_tx.clone(),
        state_tx,
        shutdown.clone(),
    );
    let task = tokio::spawn(runtime.run());

    WidgetHandle {
        event_tx,
        state_rx,
        shutdown,
        task: Some(task),
    }
}

impl WidgetHandle {
    /// Submit the text typed into the input field
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), String> {
        self.event_tx
            .send(Event::UserSubmit { text: text.into() })
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Snapshot of the current widget state
    #[allow(dead_code)] // API completeness
    pub fn state(&self) -> WidgetState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.state_rx.clone()
    }

    /// Returns the exit reason once the widget task has stopped on its own
    pub async fn exited(&mut self) -> Option<WidgetExit> {
        if !self.task.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        let task = self.task.take()?;
        Some(exit_reason(task.await))
    }

    /// Unmount the widget and wait for its teardown to finish
    pub async fn unmount(mut self) -> WidgetExit {
        self.shutdown.cancel();
        match self.task.take() {
            Some(task) => exit_reason(task.await),
            None => WidgetExit::Unmounted,
        }
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn exit_reason(joined: Result<(), tokio::task::JoinError>) -> WidgetExit {
    match joined {
        Ok(()) => WidgetExit::Unmounted,
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "widget panicked".to_string());
            WidgetExit::Crashed(message)
        }
        Err(e) => WidgetExit::Crashed(e.to_string()),
    }
}
