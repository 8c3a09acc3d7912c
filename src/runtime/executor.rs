//! Chat widget runtime executor

use super::traits::{ChannelClient, ChannelFactory};
use crate::channel::{Activity, ChannelError};
use crate::state_machine::{transition, Effect, Event, WidgetContext, WidgetState};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic widget runtime that can work with any channel implementation.
///
/// Owns the widget state exclusively; background tasks only talk to it by
/// sending [`Event`]s.
pub struct WidgetRuntime<F>
where
    F: ChannelFactory + 'static,
{
    context: WidgetContext,
    state: WidgetState,
    factory: F,
    client: Option<Arc<F::Client>>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    state_tx: watch::Sender<WidgetState>,
    /// Cancelled on unmount
    shutdown: CancellationToken,
    /// Cancels the status and activity subscriptions of the current client
    subscriptions: Option<CancellationToken>,
}

impl<F> WidgetRuntime<F>
where
    F: ChannelFactory + 'static,
{
    pub fn new(
        context: WidgetContext,
        factory: F,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        state_tx: watch::Sender<WidgetState>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            state: WidgetState::default(),
            factory,
            client: None,
            event_rx,
            event_tx,
            state_tx,
            shutdown,
            subscriptions: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(user_id = %self.context.identity.id, "Mounting chat widget");

        if let Err(e) = self.process_event(Event::Mount) {
            tracing::error!(error = %e, "Failed to mount widget");
        }

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(error = %e, "Error handling event");
                    }
                }

                else => break,
            }
        }

        self.teardown();
        tracing::info!("Chat widget unmounted");
    }

    fn process_event(&mut self, event: Event) -> Result<(), String> {
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            log_event(&current_event);

            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)
                .map_err(|e| format!("Invalid transition: {e}"))?;

            self.state = result.new_state;
            if let Some(error) = &self.state.error {
                tracing::debug!(kind = error.kind(), error = %error, "Widget error slot set");
            }

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push_back(generated_event);
                }
            }
        }

        self.publish();
        Ok(())
    }

    /// Push the current state to renderers if it changed
    fn publish(&self) {
        let state = &self.state;
        self.state_tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
    }

    /// Execute an effect and optionally return a generated event
    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::CreateClient => {
                let secret = self.context.usable_secret()?;
                match self.factory.create(secret, &self.context.transport) {
                    Ok(client) => {
                        self.client = Some(Arc::new(client));
                        None
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Failed to create channel client");
                        Some(Event::ClientCreateFailed { error })
                    }
                }
            }

            Effect::Subscribe => {
                let client = self.client.clone()?;
                let token = self.shutdown.child_token();
                self.subscriptions = Some(token.clone());

                tokio::spawn(watch_status(client.clone(), self.event_tx.clone(), token.clone()));
                tokio::spawn(consume_activities(client, self.event_tx.clone(), token));
                None
            }

            Effect::SendUserToken {
                conversation_id,
                token,
            } => {
                let activity =
                    Activity::token_response(&self.context.identity.account(), &conversation_id, &token);
                self.spawn_post(activity, |result| match result {
                    Ok(activity_id) => {
                        tracing::info!(activity_id = %activity_id, "Token sent successfully");
                        Event::TokenSent { activity_id }
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Error sending token");
                        Event::TokenFailed { error }
                    }
                });
                None
            }

            Effect::PostMessage {
                conversation_id,
                text,
            } => {
                let activity =
                    Activity::message(&self.context.identity.account(), &conversation_id, text);
                self.spawn_post(activity, |result| match result {
                    Ok(activity_id) => {
                        tracing::info!(activity_id = %activity_id, "Message sent");
                        Event::MessageSent { activity_id }
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Error sending message");
                        Event::SendFailed { error }
                    }
                });
                None
            }

            Effect::EndClient => {
                self.release_client();
                None
            }
        }
    }

    /// Fire-and-forget post; the outcome comes back as an event
    fn spawn_post<M>(&self, activity: Activity, on_result: M)
    where
        M: FnOnce(Result<String, ChannelError>) -> Event + Send + 'static,
    {
        let Some(client) = self.client.clone() else {
            // Unreachable while a conversation id is set, but report it like a transport failure
            let _ = self
                .event_tx
                .try_send(on_result(Err(ChannelError::not_connected())));
            return;
        };
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = client.post_activity(&activity).await;
            // Receiver is gone after unmount; the outcome is dropped
            let _ = event_tx.send(on_result(result)).await;
        });
    }

    fn release_client(&mut self) {
        if let Some(token) = self.subscriptions.take() {
            token.cancel();
        }
        if let Some(client) = self.client.take() {
            client.end();
            tracing::info!("Channel client ended");
        }
    }

    fn teardown(&mut self) {
        self.release_client();
        self.event_rx.close();
    }
}

fn log_event(event: &Event) {
    match event {
        Event::StatusChanged { status } => {
            tracing::info!(status = %status.describe(), "Connection status changed");
        }
        Event::ActivityReceived { activity } => {
            tracing::debug!(
                activity_type = ?activity.activity_type,
                from = %activity.from.id,
                "Activity received"
            );
        }
        _ => tracing::debug!(event = ?event, "Processing event"),
    }
}

/// Forward every status change of the client as an event
async fn watch_status<C: ChannelClient + ?Sized>(
    client: Arc<C>,
    event_tx: mpsc::Sender<Event>,
    token: CancellationToken,
) {
    let mut status_rx = client.connection_status();
    loop {
        let status = status_rx.borrow_and_update().clone();
        if event_tx.send(Event::StatusChanged { status }).await.is_err() {
            break;
        }

        tokio::select! {
            biased;
            () = token.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Status subscription closed");
}

/// Forward activities from the client until the stream fails or is cancelled
async fn consume_activities<C: ChannelClient + ?Sized>(
    client: Arc<C>,
    event_tx: mpsc::Sender<Event>,
    token: CancellationToken,
) {
    let mut activities = client.activities();
    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = activities.next() => next,
        };

        let event = match next {
            Some(Ok(activity)) => Event::ActivityReceived { activity },
            Some(Err(error)) => {
                tracing::error!(error = %error, "Activity stream failed");
                let _ = event_tx.send(Event::StreamFailed { error }).await;
                break;
            }
            None => break,
        };

        if event_tx.send(event).await.is_err() {
            break;
        }
    }
    tracing::debug!("Activity subscription closed");
}
