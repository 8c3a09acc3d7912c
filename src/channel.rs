//! Bot Framework channel boundary
//!
//! Activity types, connection status, and the Direct Line adapter used by
//! the production runtime.

mod activity;
mod directline;
mod error;

pub use activity::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, TOKEN_RESPONSE_EVENT,
};
pub use directline::{DirectLine, DirectLineClient, TransportOptions, DEFAULT_DOMAIN};
pub use error::{ChannelError, ChannelErrorKind};

use futures::stream::BoxStream;

/// Stream of activities pushed by a channel client
pub type ActivityStream = BoxStream<'static, Result<Activity, ChannelError>>;

/// Connection status reported by a channel client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Uninitialized,
    Connecting,
    /// Conversation started and the client is receiving activities
    Online { conversation_id: String },
    ExpiredToken,
    FailedToConnect { reason: String },
    Ended,
}

impl ConnectionStatus {
    /// Whether this status means the connection is gone for good
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ExpiredToken | Self::FailedToConnect { .. } | Self::Ended
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Uninitialized => "uninitialized".to_string(),
            Self::Connecting => "connecting".to_string(),
            Self::Online { conversation_id } => format!("online ({conversation_id})"),
            Self::ExpiredToken => "token expired".to_string(),
            Self::FailedToConnect { reason } => format!("failed to connect: {reason}"),
            Self::Ended => "connection ended".to_string(),
        }
    }
}
