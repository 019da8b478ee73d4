use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::BridgeError;
use crate::message::NotificationEvent;

/// The host surface that shows notices and errors to the user.
///
/// Presenting never fails from the caller's point of view; implementations
/// log delivery problems themselves.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn present(&self, event: NotificationEvent);
}

/// Push an event onto a bus channel, reporting a closed receiver.
pub async fn forward(
    tx: &mpsc::Sender<NotificationEvent>,
    event: NotificationEvent,
) -> Result<(), BridgeError> {
    tx.send(event)
        .await
        .map_err(|_| BridgeError::ChannelClosed("notification".into()))
}

#[async_trait]
impl NotificationSink for mpsc::Sender<NotificationEvent> {
    async fn present(&self, event: NotificationEvent) {
        if let Err(e) = forward(self, event).await {
            warn!(error = %e, "Dropping notification");
        }
    }
}
