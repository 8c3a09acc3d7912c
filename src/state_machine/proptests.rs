//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::channel::{Activity, ActivityType, ChannelAccount, ChannelError, ConnectionStatus};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(with_token: bool) -> WidgetContext {
    let context = WidgetContext::new(Some("test-secret".to_string()));
    if with_token {
        context.with_user_token("test-token")
    } else {
        context
    }
}

fn run(state: &WidgetState, context: &WidgetContext, event: Event) -> TransitionResult {
    transition(state, context, event).expect("mounted widget accepts every event")
}

fn mounted(context: &WidgetContext) -> WidgetState {
    run(&WidgetState::default(), context, Event::Mount).new_state
}

fn online(conversation_id: &str) -> Event {
    Event::StatusChanged {
        status: ConnectionStatus::Online {
            conversation_id: conversation_id.to_string(),
        },
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_activity_type() -> impl Strategy<Value = ActivityType> {
    prop_oneof![
        3 => Just(ActivityType::Message),
        1 => Just(ActivityType::Event),
        1 => Just(ActivityType::Typing),
        1 => Just(ActivityType::Other),
    ]
}

fn arb_activity() -> impl Strategy<Value = Activity> {
    (arb_activity_type(), "[a-z]{3,8}", "[a-zA-Z0-9 ]{0,40}").prop_map(
        |(activity_type, sender, text)| {
            let mut activity = Activity::message(&ChannelAccount::new(&sender, &sender), "conv", text);
            activity.activity_type = activity_type;
            activity.channel_data = None;
            activity
        },
    )
}

fn arb_failure_status() -> impl Strategy<Value = ConnectionStatus> {
    prop_oneof![
        Just(ConnectionStatus::ExpiredToken),
        Just(ConnectionStatus::Ended),
        "[a-z ]{1,20}".prop_map(|reason| ConnectionStatus::FailedToConnect { reason }),
    ]
}

fn arb_channel_error() -> impl Strategy<Value = ChannelError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(ChannelError::network),
        "[a-z ]{1,20}".prop_map(ChannelError::auth),
        "[a-z ]{1,20}".prop_map(ChannelError::server_error),
        "[a-z ]{1,20}".prop_map(ChannelError::unknown),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_activity().prop_map(|activity| Event::ActivityReceived { activity }),
        "[a-z0-9]{4,10}".prop_map(|id| online(&id)),
        arb_failure_status().prop_map(|status| Event::StatusChanged { status }),
        Just(Event::StatusChanged {
            status: ConnectionStatus::Connecting
        }),
        arb_channel_error().prop_map(|error| Event::TokenFailed { error }),
        arb_channel_error().prop_map(|error| Event::StreamFailed { error }),
        arb_channel_error().prop_map(|error| Event::SendFailed { error }),
        "[a-z ]{0,12}".prop_map(|text| Event::UserSubmit { text }),
        "[a-z0-9]{4}".prop_map(|activity_id| Event::MessageSent { activity_id }),
    ]
}

fn arb_whitespace() -> impl Strategy<Value = String> {
    "[ \t\n\r]{0,10}"
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Rendered list order equals arrival order of message activities
    #[test]
    fn prop_messages_keep_arrival_order(activities in proptest::collection::vec(arb_activity(), 0..40)) {
        let context = test_context(false);
        let mut state = run(&mounted(&context), &context, online("conv")).new_state;

        for activity in &activities {
            state = run(&state, &context, Event::ActivityReceived { activity: activity.clone() }).new_state;
        }

        let expected: Vec<Activity> = activities.into_iter().filter(Activity::is_message).collect();
        prop_assert_eq!(state.messages, expected);
    }

    /// The message list only ever grows, and only at the end
    #[test]
    fn prop_message_list_is_append_only(events in proptest::collection::vec(arb_event(), 0..60)) {
        let context = test_context(true);
        let mut state = mounted(&context);

        for event in events {
            let before = state.messages.clone();
            state = run(&state, &context, event).new_state;
            prop_assert!(state.messages.len() >= before.len());
            prop_assert_eq!(&state.messages[..before.len()], &before[..]);
        }
    }

    /// A captured error always wins over connecting/ready
    #[test]
    fn prop_error_takes_precedence(events in proptest::collection::vec(arb_event(), 0..60)) {
        let context = test_context(true);
        let mut state = mounted(&context);

        for event in events {
            state = run(&state, &context, event).new_state;
            match (&state.error, state.render_state()) {
                (Some(error), RenderState::Error(rendered)) => prop_assert_eq!(error, rendered),
                (None, RenderState::Error(_)) => prop_assert!(false, "error rendered without error"),
                (Some(_), _) => prop_assert!(false, "error not rendered"),
                (None, _) => {}
            }
        }
    }

    /// Whitespace-only input never posts and never changes state
    #[test]
    fn prop_blank_submit_is_noop(text in arb_whitespace(), connect in any::<bool>()) {
        let context = test_context(false);
        let mut state = mounted(&context);
        if connect {
            state = run(&state, &context, online("conv")).new_state;
        }

        let result = run(&state, &context, Event::UserSubmit { text });
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    /// A failing status while connecting goes straight to error, never ready
    #[test]
    fn prop_failed_connection_never_ready(
        status in arb_failure_status(),
        later in proptest::collection::vec(arb_activity(), 0..10),
    ) {
        let context = test_context(true);
        let mut state = run(&mounted(&context), &context, Event::StatusChanged { status }).new_state;
        prop_assert!(matches!(state.render_state(), RenderState::Error(_)));

        // A late Online cannot revive a failed connection
        state = run(&state, &context, online("conv")).new_state;
        for activity in later {
            state = run(&state, &context, Event::ActivityReceived { activity }).new_state;
        }
        prop_assert!(!matches!(state.render_state(), RenderState::Ready));
        prop_assert!(state.conversation_id.is_none());
    }

    /// The token is sent at most once per mount, and only when configured
    #[test]
    fn prop_token_sent_at_most_once(
        events in proptest::collection::vec(arb_event(), 0..60),
        with_token in any::<bool>(),
    ) {
        let context = test_context(with_token);
        let mut state = mounted(&context);
        let mut token_sends = 0;

        for event in events {
            let result = run(&state, &context, event);
            token_sends += result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::SendUserToken { .. }))
                .count();
            state = result.new_state;
        }

        prop_assert!(token_sends <= 1);
        if !with_token {
            prop_assert_eq!(token_sends, 0);
        }
    }

    /// Messages are only posted into an established conversation
    #[test]
    fn prop_posts_require_conversation(events in proptest::collection::vec(arb_event(), 0..60)) {
        let context = test_context(false);
        let mut state = mounted(&context);

        for event in events {
            let result = run(&state, &context, event);
            for effect in &result.effects {
                if let Effect::PostMessage { conversation_id, text } = effect {
                    prop_assert_eq!(state.conversation_id.as_deref(), Some(conversation_id.as_str()));
                    prop_assert!(!text.trim().is_empty());
                }
            }
            state = result.new_state;
        }
    }
}
