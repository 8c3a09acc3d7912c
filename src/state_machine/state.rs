//! Chat widget state types

use crate::channel::{Activity, ChannelAccount, TransportOptions};
use thiserror::Error;

/// Identity every outgoing activity is sent from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
}

impl UserIdentity {
    pub const DEFAULT_ID: &'static str = "user17609";
    pub const DEFAULT_NAME: &'static str = "User";

    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn account(&self) -> ChannelAccount {
        ChannelAccount::new(&self.id, &self.name)
    }
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ID, Self::DEFAULT_NAME)
    }
}

/// Immutable inputs for one mounted widget
#[derive(Debug, Clone)]
pub struct WidgetContext {
    /// Channel secret; `None` means the widget cannot start
    pub secret: Option<String>,
    /// Pre-provisioned user token sent once the conversation starts
    pub user_token: Option<String>,
    pub identity: UserIdentity,
    pub transport: TransportOptions,
}

impl WidgetContext {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret,
            user_token: None,
            identity: UserIdentity::default(),
            transport: TransportOptions::default(),
        }
    }

    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }

    pub fn with_identity(mut self, identity: UserIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Secret with surrounding whitespace removed, if one is usable
    pub fn usable_secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Connection lifecycle of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Error,
}

/// Failures the widget surfaces to the user.
///
/// All variants share one error slot; the most recent one wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),
    #[error("Failed to authenticate: {0}")]
    AuthFailed(String),
    #[error("Message stream failed: {0}")]
    StreamFailed(String),
    #[error("Failed to send message: {0}")]
    SendFailed(String),
    #[error("Chat is not ready yet, wait for the connection before sending")]
    NotReady,
}

impl WidgetError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::AuthFailed(_) => "auth_failed",
            Self::StreamFailed(_) => "stream_failed",
            Self::SendFailed(_) => "send_failed",
            Self::NotReady => "not_ready",
        }
    }
}

/// Everything the widget renders from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetState {
    pub mounted: bool,
    pub connection: ConnectionState,
    pub conversation_id: Option<String>,
    /// Received message activities in arrival order
    pub messages: Vec<Activity>,
    pub error: Option<WidgetError>,
}

/// The three mutually exclusive ways the widget renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState<'a> {
    Connecting,
    Error(&'a WidgetError),
    Ready,
}

impl WidgetState {
    /// Any captured error wins over connecting/ready
    pub fn render_state(&self) -> RenderState<'_> {
        if let Some(error) = &self.error {
            return RenderState::Error(error);
        }
        match self.connection {
            ConnectionState::Connected => RenderState::Ready,
            ConnectionState::Connecting | ConnectionState::Error => RenderState::Connecting,
        }
    }

    pub fn input_enabled(&self) -> bool {
        matches!(self.render_state(), RenderState::Ready)
    }

    pub(crate) fn fail(&mut self, error: WidgetError) {
        self.error = Some(error);
    }

    pub(crate) fn fail_connection(&mut self, error: WidgetError) {
        self.connection = ConnectionState::Error;
        self.conversation_id = None;
        self.error = Some(error);
    }
}
