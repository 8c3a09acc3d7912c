//! Direct Line v3 client over the REST polling endpoints
//!
//! Starts a conversation with the channel secret, then polls the activity
//! set with a watermark and pushes every activity to subscribers. Only the
//! calls the chat widget needs are implemented.

use super::{Activity, ActivityStream, ChannelError, ChannelErrorKind, ConnectionStatus};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DOMAIN: &str = "https://directline.botframework.com/v3/directline";

const ACTIVITY_BUFFER: usize = 256;

/// Transport settings passed to [`DirectLine::create`](crate::runtime::ChannelFactory::create)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Base URL of the Direct Line service
    pub domain: String,
    /// Delay between activity polls
    pub polling_interval: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            polling_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Factory for Direct Line clients
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLine;

impl DirectLine {
    pub fn new() -> Self {
        Self
    }
}

/// Conversation handed back by the start call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Conversation {
    conversation_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ActivitySet {
    #[serde(default)]
    activities: Vec<Activity>,
    watermark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    id: String,
}

struct Endpoint {
    http: Client,
    domain: String,
    conversation: RwLock<Option<Conversation>>,
}

impl Endpoint {
    async fn start_conversation(&self, secret: &str) -> Result<Conversation, ChannelError> {
        let response = self
            .http
            .post(format!("{}/conversations", self.domain))
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| ChannelError::from_reqwest(&e))?;

        let conversation: Conversation = read_json(response).await?;
        *self.conversation.write().await = Some(conversation.clone());
        Ok(conversation)
    }

    async fn fetch_activities(
        &self,
        conversation: &Conversation,
        watermark: Option<&str>,
    ) -> Result<ActivitySet, ChannelError> {
        let mut request = self
            .http
            .get(format!(
                "{}/conversations/{}/activities",
                self.domain, conversation.conversation_id
            ))
            .bearer_auth(&conversation.token);
        if let Some(watermark) = watermark {
            request = request.query(&[("watermark", watermark)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChannelError::from_reqwest(&e))?;
        read_json(response).await
    }

    async fn post_activity(&self, activity: &Activity) -> Result<String, ChannelError> {
        let conversation = self
            .conversation
            .read()
            .await
            .clone()
            .ok_or_else(ChannelError::not_connected)?;

        let response = self
            .http
            .post(format!(
                "{}/conversations/{}/activities",
                self.domain, conversation.conversation_id
            ))
            .bearer_auth(&conversation.token)
            .json(activity)
            .send()
            .await
            .map_err(|e| ChannelError::from_reqwest(&e))?;

        let resource: ResourceResponse = read_json(response).await?;
        Ok(resource.id)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ChannelError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChannelError::network(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(ChannelError::from_status(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ChannelError::unknown(format!("Failed to parse response: {e} - body: {body}")))
}

/// A live Direct Line connection.
///
/// The connection task starts on creation and runs until [`end`](Self::end)
/// is called or the client is dropped.
pub struct DirectLineClient {
    endpoint: Arc<Endpoint>,
    status_rx: watch::Receiver<ConnectionStatus>,
    activity_tx: broadcast::Sender<Result<Activity, ChannelError>>,
    cancel: CancellationToken,
}

impl DirectLineClient {
    /// Build the HTTP client and spawn the connection task
    pub fn connect(secret: &str, options: &TransportOptions) -> Result<Self, ChannelError> {
        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ChannelError::unknown(format!("Failed to create HTTP client: {e}")))?;

        let endpoint = Arc::new(Endpoint {
            http,
            domain: options.domain.trim_end_matches('/').to_string(),
            conversation: RwLock::new(None),
        });
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Uninitialized);
        let (activity_tx, _) = broadcast::channel(ACTIVITY_BUFFER);
        let cancel = CancellationToken::new();

        tokio::spawn(run_connection(
            endpoint.clone(),
            secret.to_string(),
            options.polling_interval,
            status_tx,
            activity_tx.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            endpoint,
            status_rx,
            activity_tx,
            cancel,
        })
    }

    pub fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Subscribe to activities delivered from now on
    pub fn activities(&self) -> ActivityStream {
        let stream = BroadcastStream::new(self.activity_tx.subscribe()).map(|item| match item {
            Ok(result) => result,
            Err(BroadcastStreamRecvError::Lagged(missed)) => Err(ChannelError::unknown(format!(
                "Activity stream lagged, {missed} activities dropped"
            ))),
        });
        Box::pin(stream)
    }

    pub async fn post_activity(&self, activity: &Activity) -> Result<String, ChannelError> {
        self.endpoint.post_activity(activity).await
    }

    pub fn end(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DirectLineClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_connection(
    endpoint: Arc<Endpoint>,
    secret: String,
    polling_interval: Duration,
    status_tx: watch::Sender<ConnectionStatus>,
    activity_tx: broadcast::Sender<Result<Activity, ChannelError>>,
    cancel: CancellationToken,
) {
    status_tx.send_replace(ConnectionStatus::Connecting);

    let started = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            status_tx.send_replace(ConnectionStatus::Ended);
            return;
        }
        result = endpoint.start_conversation(&secret) => result,
    };

    let conversation = match started {
        Ok(conversation) => conversation,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start Direct Line conversation");
            status_tx.send_replace(ConnectionStatus::FailedToConnect { reason: e.message });
            return;
        }
    };

    tracing::info!(conversation_id = %conversation.conversation_id, "Direct Line conversation started");
    status_tx.send_replace(ConnectionStatus::Online {
        conversation_id: conversation.conversation_id.clone(),
    });

    let mut watermark: Option<String> = None;
    let mut ticker = tokio::time::interval(polling_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = endpoint.fetch_activities(&conversation, watermark.as_deref()) => result,
        };

        match polled {
            Ok(set) => {
                if set.watermark.is_some() {
                    watermark = set.watermark;
                }
                for activity in set.activities {
                    // No receivers just means nobody is listening yet
                    let _ = activity_tx.send(Ok(activity));
                }
            }
            Err(e) if e.kind == ChannelErrorKind::Auth => {
                tracing::warn!(error = %e, "Direct Line token rejected while polling");
                status_tx.send_replace(ConnectionStatus::ExpiredToken);
                return;
            }
            Err(e) if e.kind.is_transient() => {
                tracing::warn!(error = %e, "Activity poll failed, polling again");
            }
            Err(e) => {
                tracing::error!(error = %e, "Activity poll failed");
                let _ = activity_tx.send(Err(e));
                // No `Ended` here: the stream error is what subscribers see
                return;
            }
        }
    }

    status_tx.send_replace(ConnectionStatus::Ended);
    tracing::info!(conversation_id = %conversation.conversation_id, "Direct Line connection ended");
}
