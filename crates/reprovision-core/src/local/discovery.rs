use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CoreError;

/// File name Xcode gives the profile embedded in an app bundle.
pub const EMBEDDED_PROFILE_NAME: &str = "embedded.mobileprovision";

/// Every `embedded.mobileprovision` under `root`, sorted by path.
///
/// Symlinks are not followed. The walk runs on the blocking pool.
pub async fn discover_profiles(root: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk(&root))
        .await
        .map_err(|e| CoreError::Internal(format!("profile discovery task failed: {e}")))?
}

fn walk(root: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| CoreError::Inspection {
            path: e.path().unwrap_or(root).display().to_string(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() && entry.file_name() == OsStr::new(EMBEDDED_PROFILE_NAME) {
            debug!(path = %entry.path().display(), "found embedded profile");
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}
