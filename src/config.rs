//! Startup configuration read from the environment

use crate::channel::{TransportOptions, DEFAULT_DOMAIN};
use crate::state_machine::{UserIdentity, WidgetContext};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const SECRET_VARS: &[&str] = &["DIRECT_LINE_SECRET", "REACT_APP_DIRECT_LINE_SECRET"];
const USER_TOKEN_VARS: &[&str] = &["DIRECT_LINE_USER_TOKEN", "REACT_APP_USER_TOKEN"];
const POLLING_INTERVAL_VAR: &str = "DIRECT_LINE_POLLING_INTERVAL_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Everything read once at startup
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub secret: Option<String>,
    pub user_token: Option<String>,
    pub domain: String,
    pub polling_interval: Duration,
    pub identity: UserIdentity,
    pub log_path: PathBuf,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let polling_interval = match get(POLLING_INTERVAL_VAR) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: POLLING_INTERVAL_VAR.to_string(),
                        value,
                    })
                }
            },
            None => TransportOptions::default().polling_interval,
        };

        let identity = UserIdentity::new(
            get("DIRECT_LINE_USER_ID").unwrap_or_else(|| UserIdentity::DEFAULT_ID.to_string()),
            get("DIRECT_LINE_USER_NAME").unwrap_or_else(|| UserIdentity::DEFAULT_NAME.to_string()),
        );

        let log_path = get("DIRECT_LINE_CHAT_LOG").map_or_else(
            || {
                get("HOME")
                    .map_or_else(|| PathBuf::from("."), PathBuf::from)
                    .join(".directline-chat")
                    .join("chat.log")
            },
            PathBuf::from,
        );

        Ok(Self {
            secret: first(SECRET_VARS),
            user_token: first(USER_TOKEN_VARS),
            domain: get("DIRECT_LINE_DOMAIN").unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            polling_interval,
            identity,
            log_path,
        })
    }

    /// Warn about optional settings that are missing
    pub fn log_warnings(&self) {
        if self.secret.is_none() {
            tracing::error!("DIRECT_LINE_SECRET is not set; the chat cannot connect");
        }
        if self.user_token.is_none() {
            tracing::warn!("DIRECT_LINE_USER_TOKEN is not set; skipping token hand-off");
        }
    }

    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            domain: self.domain.clone(),
            polling_interval: self.polling_interval,
            ..TransportOptions::default()
        }
    }

    /// Inputs for mounting a widget
    pub fn widget_context(&self) -> WidgetContext {
        let context = WidgetContext::new(self.secret.clone())
            .with_identity(self.identity.clone())
            .with_transport(self.transport());
        match &self.user_token {
            Some(token) => context.with_user_token(token),
            None => context,
        }
    }
}
