//! Direct Line activity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event name the bot expects for a pre-provisioned user token
pub const TOKEN_RESPONSE_EVENT: &str = "tokens/response";

/// Activity kinds this client distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Message,
    Event,
    Typing,
    /// Any activity type the widget does not act on (`conversationUpdate`, `endOfConversation`, ...)
    #[serde(other)]
    Other,
}

/// Sender or recipient of an activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// A message or event exchanged over the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
}

impl Activity {
    fn outgoing(activity_type: ActivityType, from: &ChannelAccount, conversation_id: &str) -> Self {
        Self {
            activity_type,
            id: None,
            from: from.clone(),
            conversation: Some(ConversationAccount {
                id: conversation_id.to_string(),
            }),
            text: None,
            timestamp: None,
            name: None,
            value: None,
            channel_data: None,
        }
    }

    /// Outgoing chat message.
    ///
    /// Carries a fresh `clientActivityID` so the echo from the service can be
    /// correlated with the post.
    pub fn message(from: &ChannelAccount, conversation_id: &str, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            channel_data: Some(json!({
                "clientActivityID": uuid::Uuid::new_v4().to_string()
            })),
            ..Self::outgoing(ActivityType::Message, from, conversation_id)
        }
    }

    /// Authentication event handing a user token to the bot
    pub fn token_response(from: &ChannelAccount, conversation_id: &str, token: &str) -> Self {
        Self {
            name: Some(TOKEN_RESPONSE_EVENT.to_string()),
            value: Some(json!({ "token": token })),
            ..Self::outgoing(ActivityType::Event, from, conversation_id)
        }
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    /// Name shown next to the message; falls back to the account id
    pub fn sender_label(&self) -> &str {
        self.from.name.as_deref().unwrap_or(&self.from.id)
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
