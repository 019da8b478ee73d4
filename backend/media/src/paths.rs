//! Mapping message ids to files in the downloads directory.
//!
//! Resolution itself never validates the id; callers must run
//! [`is_sane_id`](crate::sanitize::is_sane_id) and [`ensure_direct_child`]
//! before writing. Existence checks run on unvalidated ids and only probe.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bridgewire_core::MessageInfo;
use tokio::fs;
use tracing::{debug, warn};

use crate::store::MediaError;

/// Name of the staged file consumed by outgoing sends.
pub const OUTGOING_FILE_NAME: &str = "outgoing";

/// Absolute form of `path` with `.` and `..` folded lexically.
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Absolute path of the file holding the media of `info`.
///
/// The id is appended beneath `downloads_dir` even if it looks absolute, so a
/// hostile id can never swap out the base directory.
pub fn resolve_path(downloads_dir: &Path, info: &MessageInfo) -> PathBuf {
    let relative: PathBuf = Path::new(&info.id)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    absolute_path(&downloads_dir.join(relative))
}

/// Absolute path of the staged outgoing file.
pub fn outgoing_path(downloads_dir: &Path) -> PathBuf {
    absolute_path(&downloads_dir.join(OUTGOING_FILE_NAME))
}

/// Reject `path` unless it is exactly `<downloads_dir>/<id>`.
///
/// The staged outgoing name is refused in any ASCII case, since it shares a
/// file with the outgoing slot on case-insensitive filesystems.
pub fn ensure_direct_child(downloads_dir: &Path, path: &Path, id: &str) -> Result<(), MediaError> {
    let dir = absolute_path(downloads_dir);
    if path.parent() != Some(dir.as_path()) || path.file_name() != Some(OsStr::new(id)) {
        return Err(MediaError::Outside {
            path: path.to_path_buf(),
            dir,
        });
    }
    if id.eq_ignore_ascii_case(OUTGOING_FILE_NAME) {
        return Err(MediaError::Reserved {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Decide whether the media of `info` still needs downloading.
///
/// Any existing entry at the resolved path, including an empty placeholder,
/// means the message was handled before.
pub async fn want_download(downloads_dir: &Path, info: &MessageInfo) -> (PathBuf, bool) {
    let path = resolve_path(downloads_dir, info);
    let want = match fs::metadata(&path).await {
        Ok(_) => false,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot stat media path; treating as handled");
            false
        }
    };
    debug!(path = %path.display(), want, "Download intent");
    (path, want)
}
