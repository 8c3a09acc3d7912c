//! Events that can occur in a mounted widget

use crate::channel::{Activity, ChannelError, ConnectionStatus};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Widget was mounted by the shell; always the first event
    Mount,

    // Session events
    ClientCreateFailed {
        error: ChannelError,
    },
    StatusChanged {
        status: ConnectionStatus,
    },

    // Token hand-off events
    TokenSent {
        activity_id: String,
    },
    TokenFailed {
        error: ChannelError,
    },

    // Inbound stream events
    ActivityReceived {
        activity: Activity,
    },
    StreamFailed {
        error: ChannelError,
    },

    // Outbound events
    UserSubmit {
        text: String,
    },
    MessageSent {
        activity_id: String,
    },
    SendFailed {
        error: ChannelError,
    },
}
