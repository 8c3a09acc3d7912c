//! Trait abstractions for the channel boundary
//!
//! These traits enable testing the executor with mock implementations.

use crate::channel::{
    Activity, ActivityStream, ChannelError, ConnectionStatus, DirectLine, DirectLineClient,
    TransportOptions,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// A live connection to a bot channel
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Current connection status plus every later change
    fn connection_status(&self) -> watch::Receiver<ConnectionStatus>;

    /// Activities delivered from the moment of subscription
    fn activities(&self) -> ActivityStream;

    /// Post an activity, returning the id the service assigned
    async fn post_activity(&self, activity: &Activity) -> Result<String, ChannelError>;

    /// Stop the connection; status moves to `Ended`
    fn end(&self);
}

/// Creates channel clients from a secret
pub trait ChannelFactory: Send + Sync {
    type Client: ChannelClient + 'static;

    fn create(&self, secret: &str, options: &TransportOptions) -> Result<Self::Client, ChannelError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ChannelClient + ?Sized> ChannelClient for Arc<T> {
    fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        (**self).connection_status()
    }

    fn activities(&self) -> ActivityStream {
        (**self).activities()
    }

    async fn post_activity(&self, activity: &Activity) -> Result<String, ChannelError> {
        (**self).post_activity(activity).await
    }

    fn end(&self) {
        (**self).end();
    }
}

impl<T: ChannelFactory + ?Sized> ChannelFactory for Arc<T> {
    type Client = T::Client;

    fn create(&self, secret: &str, options: &TransportOptions) -> Result<Self::Client, ChannelError> {
        (**self).create(secret, options)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

impl ChannelFactory for DirectLine {
    type Client = DirectLineClient;

    fn create(&self, secret: &str, options: &TransportOptions) -> Result<Self::Client, ChannelError> {
        tracing::info!(domain = %options.domain, "Creating Direct Line client");
        DirectLineClient::connect(secret, options)
    }
}

#[async_trait]
impl ChannelClient for DirectLineClient {
    fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        DirectLineClient::connection_status(self)
    }

    fn activities(&self) -> ActivityStream {
        DirectLineClient::activities(self)
    }

    async fn post_activity(&self, activity: &Activity) -> Result<String, ChannelError> {
        DirectLineClient::post_activity(self, activity).await
    }

    fn end(&self) {
        DirectLineClient::end(self);
    }
}
