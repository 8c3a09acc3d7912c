//! Pure state transition function
//!
//! Session start, token hand-off, inbound stream, and outbound sends all
//! funnel through [`transition`]; nothing here performs I/O.

use super::{ConnectionState, Effect, Event, WidgetContext, WidgetError, WidgetState};
use crate::channel::ConnectionStatus;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: WidgetState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: WidgetState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Widget is already mounted")]
    AlreadyMounted,
    #[error("Widget is not mounted")]
    NotMounted,
}

/// Pure transition function
///
/// Given the same inputs, it always produces the same outputs, with no I/O
/// side effects.
#[allow(clippy::too_many_lines, clippy::match_same_arms)]
pub fn transition(
    state: &WidgetState,
    context: &WidgetContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if !state.mounted && !matches!(event, Event::Mount) {
        return Err(TransitionError::NotMounted);
    }

    let mut next = state.clone();

    match event {
        // ============================================================
        // Session start
        // ============================================================
        Event::Mount => {
            if state.mounted {
                return Err(TransitionError::AlreadyMounted);
            }
            next.mounted = true;

            if context.usable_secret().is_none() {
                next.fail_connection(WidgetError::Config(
                    "DIRECT_LINE_SECRET is not set".to_string(),
                ));
                return Ok(TransitionResult::new(next));
            }

            Ok(TransitionResult::new(next).with_effects([Effect::CreateClient, Effect::Subscribe]))
        }

        Event::ClientCreateFailed { error } => {
            next.fail_connection(WidgetError::ConnectionFailed(error.message));
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Connection status
        // ============================================================

        // Once the connection has failed we stop listening to it
        Event::StatusChanged { .. } if state.connection == ConnectionState::Error => {
            Ok(TransitionResult::new(next))
        }

        Event::StatusChanged {
            status: ConnectionStatus::Online { conversation_id },
        } => {
            if state.connection == ConnectionState::Connected {
                return Ok(TransitionResult::new(next));
            }
            next.connection = ConnectionState::Connected;
            next.conversation_id = Some(conversation_id.clone());

            let result = TransitionResult::new(next);
            Ok(match &context.user_token {
                Some(token) => result.with_effect(Effect::send_user_token(&conversation_id, token)),
                None => result,
            })
        }

        // The stream failed first; the connection ending is its consequence
        Event::StatusChanged {
            status: ConnectionStatus::Ended,
        } if matches!(state.error, Some(WidgetError::StreamFailed(_))) => {
            next.connection = ConnectionState::Error;
            next.conversation_id = None;
            Ok(TransitionResult::new(next).with_effect(Effect::EndClient))
        }

        Event::StatusChanged { status } if status.is_failure() => {
            next.fail_connection(WidgetError::ConnectionFailed(status.describe()));
            Ok(TransitionResult::new(next).with_effect(Effect::EndClient))
        }

        Event::StatusChanged { .. } => Ok(TransitionResult::new(next)),

        // ============================================================
        // Token hand-off
        // ============================================================
        Event::TokenSent { .. } | Event::MessageSent { .. } => Ok(TransitionResult::new(next)),

        Event::TokenFailed { error } => {
            next.fail(WidgetError::AuthFailed(error.message));
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Inbound stream
        // ============================================================
        Event::ActivityReceived { activity } => {
            if activity.is_message() {
                next.messages.push(activity);
            }
            Ok(TransitionResult::new(next))
        }

        Event::StreamFailed { error } => {
            next.fail(WidgetError::StreamFailed(error.message));
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Outbound sends
        // ============================================================
        Event::UserSubmit { text } => {
            if text.trim().is_empty() {
                return Ok(TransitionResult::new(next));
            }
            match state.conversation_id.as_deref() {
                Some(conversation_id) => Ok(TransitionResult::new(next)
                    .with_effect(Effect::post_message(conversation_id, text))),
                None => {
                    next.fail(WidgetError::NotReady);
                    Ok(TransitionResult::new(next))
                }
            }
        }

        Event::SendFailed { error } => {
            next.fail(WidgetError::SendFailed(error.message));
            Ok(TransitionResult::new(next))
        }
    }
}
