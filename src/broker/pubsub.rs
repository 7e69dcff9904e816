//! Pub/sub command source
//!
//! The service subscribes to the channel named after itself. A forwarder
//! task turns every message into a [`Command`] and queues it; the service
//! loop drains the queue once per cycle without blocking.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{Result, ServiceError};
use crate::service::Command;

pub struct CommandSubscription {
    channel: String,
    rx: mpsc::UnboundedReceiver<Command>,
    forwarder: JoinHandle<()>,
}

impl CommandSubscription {
    /// Subscribe to `channel` and start forwarding its messages
    pub async fn subscribe(client: &redis::Client, channel: &str) -> Result<Self> {
        let mut pubsub = client.get_async_pubsub().await.map_err(|e| {
            ServiceError::redis_connection(format!("Failed to open pub/sub connection: {}", e))
        })?;
        pubsub.subscribe(channel).await?;
        debug!("Subscribed to channel '{}'", channel);

        let (tx, rx) = mpsc::unbounded_channel();
        let expected = channel.to_string();
        let forwarder = tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let channel = msg.get_channel_name();
                let Some(command) = accept_message(&expected, channel, msg.get_payload_bytes())
                else {
                    continue;
                };
                if tx.send(command).is_err() {
                    break;
                }
            }
            warn!("Command subscription to '{}' closed", expected);
        });

        Ok(Self {
            channel: channel.to_string(),
            rx,
            forwarder,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Every command received since the last call
    pub fn drain(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = self.rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    pub fn close(&mut self) {
        self.forwarder.abort();
        self.rx.close();
    }
}

impl Drop for CommandSubscription {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Parse a pub/sub message, ignoring traffic for other channels
fn accept_message(expected: &str, channel: &str, payload: &[u8]) -> Option<Command> {
    if channel != expected {
        return None;
    }
    let text = String::from_utf8_lossy(payload);
    debug!("Got message on '{}': {:?}", channel, text);
    Some(Command::parse(&text))
}
