//! Inbound media: decide, validate, download, then persist or inline.
//!
//! Every call ends in exactly one [`ReceiveOutcome`] and at most one
//! notification. Nothing here fails towards the caller; all errors become
//! conversation errors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bridgewire_config::MediaSettings;
use bridgewire_core::{MessageInfo, NotificationEvent, NotificationSink};
use bridgewire_logging::{EventLogger, TransferEvent, TransferOutcome};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::kind::MediaKind;
use crate::locks::PathLocks;
use crate::paths::{ensure_direct_child, resolve_path, want_download};
use crate::sanitize::is_sane_id;
use crate::store::store_downloaded_data;

pub const DOWNLOADS_DISABLED_NOTICE: &str = "[File download disabled in settings.]";

const RETRY_ENABLED: &str = "Retrying on next occasion is enabled.";
const WILL_NOT_RETRY: &str = "Will not try to download again.";

/// Anything that can fetch the raw bytes of a media message.
#[async_trait]
pub trait Downloadable: Send + Sync {
    fn kind(&self) -> MediaKind;

    async fn download(&self) -> anyhow::Result<Bytes>;
}

/// Per-call-site receive flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveOptions {
    /// Return the bytes to the caller instead of writing them to disk.
    pub inline: bool,
}

impl ReceiveOptions {
    /// Images are inlined when the settings ask for it; everything else is stored.
    pub fn for_kind(settings: &MediaSettings, kind: MediaKind) -> Self {
        Self {
            inline: kind == MediaKind::Image && settings.inline_images,
        }
    }
}

/// What happened to the failure placeholder after a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderResult {
    NotRequested,
    Written,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// A file already exists for this id; nothing was done.
    AlreadyHandled,
    DownloadsDisabled,
    UnsafeIdentifier,
    DownloadFailed { placeholder: PlaceholderResult },
    Inline(Bytes),
    Stored(PathBuf),
    StoreFailed,
}

impl ReceiveOutcome {
    /// The downloaded bytes, for inline deliveries only.
    pub fn into_inline(self) -> Option<Bytes> {
        match self {
            ReceiveOutcome::Inline(data) => Some(data),
            _ => None,
        }
    }

    fn to_transfer(&self, trail: &Trail) -> TransferOutcome {
        match self {
            ReceiveOutcome::AlreadyHandled => TransferOutcome::AlreadyHandled,
            ReceiveOutcome::DownloadsDisabled => TransferOutcome::DownloadsDisabled,
            ReceiveOutcome::UnsafeIdentifier => TransferOutcome::UnsafeIdentifier,
            ReceiveOutcome::DownloadFailed { placeholder } => TransferOutcome::DownloadFailed {
                error: trail.download_error.clone().unwrap_or_default(),
                placeholder_written: *placeholder == PlaceholderResult::Written,
            },
            ReceiveOutcome::Inline(data) => TransferOutcome::Inline { bytes: data.len() },
            ReceiveOutcome::Stored(path) => TransferOutcome::Stored {
                path: path.display().to_string(),
                bytes: trail.stored_bytes,
            },
            ReceiveOutcome::StoreFailed => TransferOutcome::StoreFailed {
                error: trail.store_error.clone().unwrap_or_default(),
            },
        }
    }
}

/// Error texts collected along the way, for the transfer log only.
#[derive(Default)]
struct Trail {
    download_error: Option<String>,
    store_error: Option<String>,
    stored_bytes: usize,
}

pub struct MediaReceiver<N> {
    settings: MediaSettings,
    sink: N,
    locks: PathLocks,
}

impl<N: NotificationSink> MediaReceiver<N> {
    pub fn new(settings: MediaSettings, sink: N) -> Self {
        Self {
            settings,
            sink,
            locks: PathLocks::new(),
        }
    }

    pub fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    /// Handle the media of one inbound message.
    ///
    /// Deliveries of the same id are serialized, so at most one of them
    /// downloads and notifies.
    pub async fn receive(
        &self,
        media: &dyn Downloadable,
        info: &MessageInfo,
        options: ReceiveOptions,
    ) -> ReceiveOutcome {
        let dir = self.settings.downloads_directory.as_path();
        let mut trail = Trail::default();

        let outcome = {
            let path = resolve_path(dir, info);
            let _guard = self.locks.acquire(&path).await;
            self.receive_locked(dir, media, info, options, &mut trail).await
        };
        self.locks.prune().await;

        EventLogger::log_transfer(TransferEvent::new(
            &info.id,
            &info.remote_jid,
            media.kind().as_str(),
            outcome.to_transfer(&trail),
        ));

        outcome
    }

    async fn receive_locked(
        &self,
        dir: &Path,
        media: &dyn Downloadable,
        info: &MessageInfo,
        options: ReceiveOptions,
        trail: &mut Trail,
    ) -> ReceiveOutcome {
        let (path, want) = want_download(dir, info).await;
        if !want {
            debug!(id = %info.id, "Media already handled, skipping");
            return ReceiveOutcome::AlreadyHandled;
        }

        if !self.settings.downloads_enabled {
            self.sink
                .present(NotificationEvent::system_for(info, DOWNLOADS_DISABLED_NOTICE))
                .await;
            return ReceiveOutcome::DownloadsDisabled;
        }

        if !is_sane_id(&info.id) || ensure_direct_child(dir, &path, &info.id).is_err() {
            warn!(id = ?info.id, "Refusing to download media with unsafe message id");
            self.sink
                .present(NotificationEvent::conversation_error(
                    info,
                    format!(
                        "A media message (ID {}) was received, but ID looks not sane – downloading skipped.",
                        info.id
                    ),
                ))
                .await;
            return ReceiveOutcome::UnsafeIdentifier;
        }

        let data = match media.download().await {
            Ok(data) => data,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(id = %info.id, kind = %media.kind(), error = %error, "Media download failed");
                let placeholder = self.mark_failed(dir, &path).await;
                let retry_comment = match &placeholder {
                    PlaceholderResult::NotRequested => RETRY_ENABLED.to_string(),
                    PlaceholderResult::Written => WILL_NOT_RETRY.to_string(),
                    PlaceholderResult::Failed(store_err) => format!(
                        "Unable to mark download as failed ({store_err}). Will try to download again."
                    ),
                };
                self.sink
                    .present(NotificationEvent::conversation_error(
                        info,
                        format!(
                            "A media message (ID {}) was received, but the download failed: {error}. {retry_comment}",
                            info.id
                        ),
                    ))
                    .await;
                trail.download_error = Some(error);
                return ReceiveOutcome::DownloadFailed { placeholder };
            }
        };

        if options.inline {
            debug!(id = %info.id, bytes = data.len(), "Returning media inline");
            return ReceiveOutcome::Inline(data);
        }

        match store_downloaded_data(dir, &path, &data).await {
            Ok(()) => {
                info!(id = %info.id, kind = %media.kind(), path = %path.display(), "Media stored");
                self.sink
                    .present(NotificationEvent::system_for(
                        info,
                        format!("file://{}", path.display()),
                    ))
                    .await;
                trail.stored_bytes = data.len();
                ReceiveOutcome::Stored(path)
            }
            Err(e) => {
                warn!(id = %info.id, error = %e, "Storing media failed");
                self.sink
                    .present(NotificationEvent::conversation_error(info, e.to_string()))
                    .await;
                trail.store_error = Some(e.to_string());
                ReceiveOutcome::StoreFailed
            }
        }
    }

    async fn mark_failed(&self, dir: &Path, path: &Path) -> PlaceholderResult {
        if !self.settings.store_failed_downloads {
            return PlaceholderResult::NotRequested;
        }
        match store_downloaded_data(dir, path, &[]).await {
            Ok(()) => PlaceholderResult::Written,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not write failure placeholder");
                PlaceholderResult::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct FakeMedia {
        kind: MediaKind,
        result: Result<Bytes, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeMedia {
        fn ok(data: &'static [u8]) -> Self {
            Self {
                kind: MediaKind::Image,
                result: Ok(Bytes::from_static(data)),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                kind: MediaKind::Audio,
                result: Err(msg.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Downloadable for FakeMedia {
        fn kind(&self) -> MediaKind {
            self.kind
        }

        async fn download(&self) -> anyhow::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone().map_err(anyhow::Error::msg)
        }
    }

    fn receiver(
        settings: MediaSettings,
    ) -> (MediaReceiver<mpsc::Sender<NotificationEvent>>, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (MediaReceiver::new(settings, tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<NotificationEvent>) -> Vec<NotificationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn info(id: &str) -> MessageInfo {
        MessageInfo::new(id, "4915112345678@s.whatsapp.net")
    }

    #[tokio::test]
    async fn stores_and_announces_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::ok(&[0x01, 0x02]);

        let outcome = receiver
            .receive(&media, &info("ABC123"), ReceiveOptions::default())
            .await;

        let path = dir.path().join("ABC123");
        assert_eq!(outcome, ReceiveOutcome::Stored(path.clone()));
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x01, 0x02]);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].system);
        assert_eq!(events[0].text, format!("file://{}", path.display()));
        assert_eq!(events[0].info.as_ref().unwrap().id, "ABC123");
    }

    #[tokio::test]
    async fn repeated_delivery_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::ok(b"jpeg");

        receiver.receive(&media, &info("ABC123"), ReceiveOptions::default()).await;
        drain(&mut rx);

        let outcome = receiver
            .receive(&media, &info("ABC123"), ReceiveOptions::default())
            .await;
        assert_eq!(outcome, ReceiveOutcome::AlreadyHandled);
        assert_eq!(media.calls(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn unsafe_id_is_rejected_and_not_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::ok(b"data");

        for _ in 0..2 {
            let outcome = receiver
                .receive(&media, &info("bad/id"), ReceiveOptions::default())
                .await;
            assert_eq!(outcome, ReceiveOutcome::UnsafeIdentifier);

            let events = drain(&mut rx);
            assert_eq!(events.len(), 1);
            assert!(events[0].is_error());
            assert!(events[0].text.contains("looks not sane"));
            assert!(events[0].text.contains("bad/id"));
        }

        assert_eq!(media.calls(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        let (_, want) = want_download(dir.path(), &info("bad/id")).await;
        assert!(want);
    }

    #[tokio::test]
    async fn outgoing_slot_name_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::ok(b"data");

        let outcome = receiver
            .receive(&media, &info("OUTGOING"), ReceiveOptions::default())
            .await;
        assert_eq!(outcome, ReceiveOutcome::UnsafeIdentifier);
        assert!(drain(&mut rx)[0].is_error());
        assert_eq!(media.calls(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_id_never_touches_disk() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("downloads");
        let (receiver, mut rx) = receiver(MediaSettings::new(&dir));
        let media = FakeMedia::ok(b"data");

        let outcome = receiver.receive(&media, &info(""), ReceiveOptions::default()).await;
        assert_eq!(outcome, ReceiveOutcome::UnsafeIdentifier);
        assert_eq!(drain(&mut rx).len(), 1);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn disabled_downloads_emit_notice_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = MediaSettings::new(dir.path());
        settings.downloads_enabled = false;
        let (receiver, mut rx) = receiver(settings);
        let media = FakeMedia::ok(b"data");

        for id in ["ABC123", "bad/id"] {
            let outcome = receiver.receive(&media, &info(id), ReceiveOptions::default()).await;
            assert_eq!(outcome, ReceiveOutcome::DownloadsDisabled);

            let events = drain(&mut rx);
            assert_eq!(events.len(), 1);
            assert!(events[0].system);
            assert_eq!(events[0].text, DOWNLOADS_DISABLED_NOTICE);
        }

        assert_eq!(media.calls(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_download_writes_placeholder_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = MediaSettings::new(dir.path());
        settings.store_failed_downloads = true;
        let (receiver, mut rx) = receiver(settings);
        let media = FakeMedia::failing("media key expired");

        let outcome = receiver
            .receive(&media, &info("ABC123"), ReceiveOptions::default())
            .await;
        assert_eq!(
            outcome,
            ReceiveOutcome::DownloadFailed {
                placeholder: PlaceholderResult::Written
            }
        );

        let path = dir.path().join("ABC123");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
        assert_eq!(
            events[0].text,
            "A media message (ID ABC123) was received, but the download failed: media key expired. Will not try to download again."
        );

        let (_, want) = want_download(dir.path(), &info("ABC123")).await;
        assert!(!want);
        let again = receiver
            .receive(&media, &info("ABC123"), ReceiveOptions::default())
            .await;
        assert_eq!(again, ReceiveOutcome::AlreadyHandled);
        assert_eq!(media.calls(), 1);
    }

    #[tokio::test]
    async fn failed_download_is_retried_without_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::failing("connection reset");

        for _ in 0..2 {
            let outcome = receiver
                .receive(&media, &info("ABC123"), ReceiveOptions::default())
                .await;
            assert_eq!(
                outcome,
                ReceiveOutcome::DownloadFailed {
                    placeholder: PlaceholderResult::NotRequested
                }
            );
            let events = drain(&mut rx);
            assert_eq!(events.len(), 1);
            assert!(events[0].text.ends_with("Retrying on next occasion is enabled."));
        }

        assert_eq!(media.calls(), 2);
        assert!(!dir.path().join("ABC123").exists());
    }

    /// A downloads directory that stats as missing but cannot be created.
    #[cfg(unix)]
    fn uncreatable_dir(root: &Path) -> PathBuf {
        let dir = root.join("downloads");
        std::os::unix::fs::symlink(root.join("missing-target").join("x"), &dir).unwrap();
        dir
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn placeholder_failure_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let mut settings = MediaSettings::new(uncreatable_dir(root.path()));
        settings.store_failed_downloads = true;
        let (receiver, mut rx) = receiver(settings);

        let outcome = receiver
            .receive(&FakeMedia::failing("gone"), &info("ABC123"), ReceiveOptions::default())
            .await;
        assert!(matches!(
            outcome,
            ReceiveOutcome::DownloadFailed {
                placeholder: PlaceholderResult::Failed(_)
            }
        ));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].text.contains("Unable to mark download as failed"));
        assert!(events[0].text.ends_with("Will try to download again."));
    }

    #[tokio::test]
    async fn inline_returns_bytes_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let media = FakeMedia::ok(b"thumbnail");

        let outcome = receiver
            .receive(&media, &info("ABC123"), ReceiveOptions { inline: true })
            .await;
        assert_eq!(outcome.into_inline(), Some(Bytes::from_static(b"thumbnail")));
        assert!(drain(&mut rx).is_empty());
        assert!(!dir.path().join("ABC123").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn store_failure_becomes_conversation_error() {
        let root = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(uncreatable_dir(root.path())));

        let outcome = receiver
            .receive(&FakeMedia::ok(b"data"), &info("ABC123"), ReceiveOptions::default())
            .await;
        assert_eq!(outcome, ReceiveOutcome::StoreFailed);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
        assert!(events[0].text.contains("could not be created"));
    }

    #[tokio::test]
    async fn concurrent_deliveries_download_once() {
        let dir = tempfile::tempdir().unwrap();
        let (receiver, mut rx) = receiver(MediaSettings::new(dir.path()));
        let receiver = Arc::new(receiver);
        let mut media = FakeMedia::ok(b"slow");
        media.delay = Duration::from_millis(30);
        let media = Arc::new(media);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let media = Arc::clone(&media);
                tokio::spawn(async move {
                    receiver
                        .receive(media.as_ref(), &info("ABC123"), ReceiveOptions::default())
                        .await
                })
            })
            .collect();

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                ReceiveOutcome::Stored(_) => stored += 1,
                ReceiveOutcome::AlreadyHandled => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(stored, 1);
        assert_eq!(media.calls(), 1);
        assert_eq!(drain(&mut rx).len(), 1);
        assert!(receiver.locks.is_empty().await);
    }

    #[test]
    fn inline_option_follows_settings() {
        let mut settings = MediaSettings::new("/srv/downloads");
        assert!(!ReceiveOptions::for_kind(&settings, MediaKind::Image).inline);
        settings.inline_images = true;
        assert!(ReceiveOptions::for_kind(&settings, MediaKind::Image).inline);
        assert!(!ReceiveOptions::for_kind(&settings, MediaKind::Audio).inline);
    }
}
