//! Media transfer for the chat bridge.
//!
//! Inbound media is downloaded into `<downloads>/<MESSAGE_ID>` at most once
//! per id; outbound media is read from the staged `<downloads>/outgoing`
//! file. Results are reported through a [`NotificationSink`](bridgewire_core::NotificationSink).

pub mod kind;
pub mod locks;
pub mod paths;
pub mod receive;
pub mod sanitize;
pub mod send;
pub mod store;

pub use kind::MediaKind;
pub use locks::PathLocks;
pub use paths::{ensure_direct_child, outgoing_path, resolve_path, want_download, OUTGOING_FILE_NAME};
pub use receive::{
    Downloadable, MediaReceiver, PlaceholderResult, ReceiveOptions, ReceiveOutcome,
    DOWNLOADS_DISABLED_NOTICE,
};
pub use sanitize::is_sane_id;
pub use send::{
    requested_kind, MediaDispatcher, MediaSender, OutgoingMedia, AUDIO_CONTENT_TYPE,
    IMAGE_CONTENT_TYPE,
};
pub use store::{store_downloaded_data, MediaError};
