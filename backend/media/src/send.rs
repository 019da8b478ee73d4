//! Outgoing media: wrap the staged file as an image or audio upload.
//!
//! The media type is picked from keywords in the trigger text, and the
//! content type is fixed per kind. File contents are not inspected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bridgewire_config::MediaSettings;
use bridgewire_core::{MessageInfo, NotificationEvent, NotificationSink};
use bridgewire_logging::{EventLogger, TransferEvent, TransferOutcome};
use tokio::fs::File;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::kind::MediaKind;
use crate::paths::outgoing_path;

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
pub const AUDIO_CONTENT_TYPE: &str = "audio/ogg";

/// An upload payload ready for the protocol layer.
#[derive(Debug)]
pub struct OutgoingMedia {
    pub kind: MediaKind,
    pub content_type: &'static str,
    pub content: File,
}

impl OutgoingMedia {
    pub fn image(content: File) -> Self {
        Self {
            kind: MediaKind::Image,
            content_type: IMAGE_CONTENT_TYPE,
            content,
        }
    }

    pub fn audio(content: File) -> Self {
        Self {
            kind: MediaKind::Audio,
            content_type: AUDIO_CONTENT_TYPE,
            content,
        }
    }
}

/// The protocol's generic message-send operation.
#[async_trait]
pub trait MediaDispatcher: Send + Sync {
    /// Host-specific completion handle.
    type Receipt: Send;

    async fn send_media(&self, media: OutgoingMedia, info: &MessageInfo) -> anyhow::Result<Self::Receipt>;
}

/// Media kind requested by `text`. `image` wins over `audio`; matching is case-sensitive.
pub fn requested_kind(text: &str) -> Option<MediaKind> {
    if text.contains("image") {
        Some(MediaKind::Image)
    } else if text.contains("audio") {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

pub struct MediaSender<D, N> {
    staged: PathBuf,
    dispatcher: D,
    sink: N,
    slot: Mutex<()>,
}

impl<D: MediaDispatcher, N: NotificationSink> MediaSender<D, N> {
    pub fn new(settings: &MediaSettings, dispatcher: D, sink: N) -> Self {
        Self {
            staged: outgoing_path(&settings.downloads_directory),
            dispatcher,
            sink,
            slot: Mutex::new(()),
        }
    }

    /// Where the next outgoing file has to be staged.
    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Send the staged file as the media kind named in `text`.
    ///
    /// Returns the dispatcher's receipt, or `None` after reporting the
    /// problem to the conversation. The staged slot stays locked until the
    /// dispatcher returns.
    pub async fn send(&self, info: &MessageInfo, text: &str) -> Option<D::Receipt> {
        let _slot = self.slot.lock().await;

        let content = match File::open(&self.staged).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %self.staged.display(), error = %e, "Cannot open staged file");
                return self
                    .reject(info, None, format!("Unable to read file which was going to be sent: {e}"))
                    .await;
            }
        };

        let media = match requested_kind(text) {
            Some(MediaKind::Image) => OutgoingMedia::image(content),
            Some(MediaKind::Audio) => OutgoingMedia::audio(content),
            _ => {
                return self
                    .reject(info, None, "Please specify file type image or audio".to_string())
                    .await;
            }
        };

        let kind = media.kind;
        let content_type = media.content_type;
        match self.dispatcher.send_media(media, info).await {
            Ok(receipt) => {
                info!(id = %info.id, %kind, "Media message dispatched");
                EventLogger::log_transfer(TransferEvent::new(
                    &info.id,
                    &info.remote_jid,
                    kind.as_str(),
                    TransferOutcome::Sent {
                        content_type: content_type.to_string(),
                    },
                ));
                Some(receipt)
            }
            Err(e) => {
                warn!(id = %info.id, %kind, error = %e, "Media dispatch failed");
                self.reject(info, Some(kind), format!("Unable to send media message: {e:#}"))
                    .await
            }
        }
    }

    async fn reject(
        &self,
        info: &MessageInfo,
        kind: Option<MediaKind>,
        text: String,
    ) -> Option<D::Receipt> {
        EventLogger::log_transfer(TransferEvent::new(
            &info.id,
            &info.remote_jid,
            kind.map_or("unknown", |k| k.as_str()),
            TransferOutcome::SendRejected {
                reason: text.clone(),
            },
        ));
        self.sink
            .present(NotificationEvent::conversation_error(info, text))
            .await;
        None
    }
}
