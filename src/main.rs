//! Direct Line Chat - terminal chat client for Bot Framework bots
//!
//! Mounts a chat widget that talks to a bot over the Direct Line channel and
//! renders the conversation in the terminal.

mod channel;
mod config;
mod runtime;
mod shell;
mod state_machine;

use channel::DirectLine;
use config::ChatConfig;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = ChatConfig::from_env()?;

    // The terminal belongs to the UI, so logs go to a file
    init_logging(&config.log_path)?;
    config.log_warnings();

    tracing::info!(
        domain = %config.domain,
        user_id = %config.identity.id,
        log = %config.log_path.display(),
        "Starting Direct Line chat"
    );

    shell::run(&config.widget_context(), &DirectLine::new()).await?;

    tracing::info!("Direct Line chat exited");
    Ok(())
}

fn init_logging(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directline_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
