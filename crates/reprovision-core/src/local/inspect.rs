// Reads values out of a CMS-signed provisioning profile with the macOS
// `security` and `PlistBuddy` tools.

#![allow(async_fn_in_trait)]

use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;
use tracing::debug;

use crate::error::CoreError;

const SECURITY: &str = "security";
const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

/// Name and platform of an installed profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedProfile {
    pub path: PathBuf,
    pub name: String,
    /// `PlistBuddy` rendering of the `Platform` array, e.g. `Array {\n    iOS\n}`.
    pub platform: String,
}

impl InspectedProfile {
    pub fn is_ios(&self) -> bool {
        self.platform.contains("iOS")
    }
}

pub trait ProfileInspector {
    async fn inspect(&self, path: &Path) -> Result<InspectedProfile, CoreError>;
}

/// Decodes with `security cms -D -i` and reads keys with `PlistBuddy`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityCmsInspector;

impl SecurityCmsInspector {
    async fn run(path: &Path, cmd: &mut Command) -> Result<Output, CoreError> {
        let output = cmd.output().await.map_err(|e| CoreError::Inspection {
            path: path.display().to_string(),
            reason: format!("failed to run {:?}: {e}", cmd.as_std().get_program()),
        })?;
        if !output.status.success() {
            let mut reason = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            if reason.is_empty() {
                reason = String::from_utf8_lossy(&output.stdout).trim().to_owned();
            }
            return Err(CoreError::Inspection {
                path: path.display().to_string(),
                reason: format!("{:?} exited with {}: {reason}", cmd.as_std().get_program(), output.status),
            });
        }
        Ok(output)
    }

    async fn print_key(profile: &Path, plist: &Path, key: &str) -> Result<String, CoreError> {
        let output = Self::run(
            profile,
            Command::new(PLIST_BUDDY)
                .arg("-c")
                .arg(format!("Print {key}"))
                .arg(plist),
        )
        .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl ProfileInspector for SecurityCmsInspector {
    async fn inspect(&self, path: &Path) -> Result<InspectedProfile, CoreError> {
        let decoded = Self::run(path, Command::new(SECURITY).args(["cms", "-D", "-i"]).arg(path)).await?;

        let to_err = |e: std::io::Error| CoreError::Inspection {
            path: path.display().to_string(),
            reason: format!("temporary plist: {e}"),
        };
        let mut plist = tempfile::Builder::new()
            .suffix(".plist")
            .tempfile()
            .map_err(to_err)?;
        plist.write_all(&decoded.stdout).map_err(to_err)?;
        plist.flush().map_err(to_err)?;

        let name = Self::print_key(path, plist.path(), "Name").await?;
        let platform = Self::print_key(path, plist.path(), "Platform").await?;
        debug!(path = %path.display(), name = %name, platform = %platform, "inspected profile");

        Ok(InspectedProfile {
            path: path.to_path_buf(),
            name,
            platform,
        })
    }
}

/// Profile names in first-seen order, without repeats. An app and its
/// extensions often embed the same profile.
pub fn unique_names(profiles: &[InspectedProfile]) -> Vec<String> {
    let mut seen = HashSet::new();
    profiles
        .iter()
        .filter(|p| seen.insert(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect()
}
