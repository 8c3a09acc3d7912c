//! Chat widget state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! channel signals and user input come in as [`Event`]s, the transition
//! function returns the next [`WidgetState`] plus the [`Effect`]s the
//! runtime must perform.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConnectionState, RenderState, UserIdentity, WidgetContext, WidgetError, WidgetState};
pub use transition::{transition, TransitionError, TransitionResult};
