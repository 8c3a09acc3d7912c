//! Shell-side UI state and key handling

use crate::state_machine::{RenderState, WidgetState};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the run loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Send the typed text, exactly as entered
    Submit(String),
    /// Unmount the widget and mount a fresh one
    Reload,
    Quit,
}

/// State owned by the terminal shell, not the widget
#[derive(Debug, Default)]
pub struct App {
    input: String,
    /// Lines scrolled up from the newest message
    scroll: usize,
    tick: usize,
    crashed: Option<String>,
}

impl App {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Reason the widget task crashed, if it did
    pub fn crashed(&self) -> Option<&str> {
        self.crashed.as_deref()
    }

    pub fn crash(&mut self, reason: String) {
        self.crashed = Some(reason);
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &WidgetState) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Char('r') if ctrl => {
                let errored = matches!(state.render_state(), RenderState::Error(_));
                return if errored || self.crashed.is_some() {
                    Action::Reload
                } else {
                    Action::None
                };
            }
            _ => {}
        }

        if self.crashed.is_some() || !state.input_enabled() {
            return Action::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.input.trim().is_empty() {
                    Action::None
                } else {
                    self.scroll = 0;
                    Action::Submit(std::mem::take(&mut self.input))
                }
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_add(10);
                Action::None
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(10);
                Action::None
            }
            KeyCode::End => {
                self.scroll = 0;
                Action::None
            }
            _ => Action::None,
        }
    }
}
