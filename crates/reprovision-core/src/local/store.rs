use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use crate::error::CoreError;
use crate::model::Profile;
use crate::remote::ProfileWriter;

/// Where Xcode and `xcodebuild` look for installed profiles.
const PROFILES_SUBDIR: &str = "Library/MobileDevice/Provisioning Profiles";

/// Writes profiles as `<dir>/<UUID>.mobileprovision`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/Library/MobileDevice/Provisioning Profiles`.
    pub fn default_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(PROFILES_SUBDIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, uuid: &str) -> PathBuf {
        self.dir.join(format!("{uuid}.mobileprovision"))
    }
}

impl ProfileWriter for ProfileStore {
    async fn write_profile(&self, profile: &Profile, content: &[u8]) -> Result<PathBuf, CoreError> {
        let fail = |e: std::io::Error| CoreError::Install {
            name: profile.name.clone(),
            uuid: profile.uuid.clone(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(fail)?;
        let path = self.path_for(&profile.uuid);
        tokio::fs::write(&path, content).await.map_err(fail)?;
        debug!(path = %path.display(), bytes = content.len(), "wrote profile");
        Ok(path)
    }
}
