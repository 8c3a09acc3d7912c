//! Effects produced by state transitions

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create the channel client from the configured secret
    CreateClient,

    /// Subscribe to the client's status signal and activity stream
    Subscribe,

    /// Post the one-time `tokens/response` event (spawns as background task)
    SendUserToken {
        conversation_id: String,
        token: String,
    },

    /// Post a chat message (spawns as background task)
    PostMessage {
        conversation_id: String,
        text: String,
    },

    /// Stop subscriptions and end the client
    EndClient,
}

impl Effect {
    pub fn send_user_token(conversation_id: &str, token: &str) -> Self {
        Effect::SendUserToken {
            conversation_id: conversation_id.to_string(),
            token: token.to_string(),
        }
    }

    pub fn post_message(conversation_id: &str, text: String) -> Self {
        Effect::PostMessage {
            conversation_id: conversation_id.to_string(),
            text,
        }
    }
}
