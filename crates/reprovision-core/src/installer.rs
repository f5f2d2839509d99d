// ── Profile installer ──

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::CoreError;
use crate::model::Profile;
use crate::remote::{ProfileDownload, ProfileWriter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installed {
    pub name: String,
    pub uuid: String,
    pub path: PathBuf,
}

/// Downloads a profile's signed content and hands it to a writer.
pub struct ProfileInstaller<'a, D, W> {
    remote: &'a D,
    writer: &'a W,
}

impl<'a, D: ProfileDownload, W: ProfileWriter> ProfileInstaller<'a, D, W> {
    pub fn new(remote: &'a D, writer: &'a W) -> Self {
        Self { remote, writer }
    }

    /// Any failure is reported with the profile's name and UUID.
    pub async fn install(&self, profile: &Profile) -> Result<Installed, CoreError> {
        let context = |e: CoreError| match e {
            e @ CoreError::Install { .. } => e,
            other => CoreError::Install {
                name: profile.name.clone(),
                uuid: profile.uuid.clone(),
                reason: other.to_string(),
            },
        };

        let content = self.remote.download_profile(profile).await.map_err(context)?;
        let path = self
            .writer
            .write_profile(profile, &content)
            .await
            .map_err(context)?;

        info!(name = %profile.name, uuid = %profile.uuid, path = %path.display(), "installed profile");
        Ok(Installed {
            name: profile.name.clone(),
            uuid: profile.uuid.clone(),
            path,
        })
    }
}
