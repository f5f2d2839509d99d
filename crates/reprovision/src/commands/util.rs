//! Shared rows and helpers for command handlers.

use std::path::PathBuf;

use tabled::Tabled;

use reprovision_core::{DeviceReport, Installed, ProfileStore, ReconcileSummary, Registration};

use crate::cli::InstallTarget;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "UDID")]
    pub udid: String,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "ID")]
    pub id: String,
}

impl DeviceRow {
    pub fn new(report: &DeviceReport, color: bool) -> Self {
        let (changed, id) = match &report.registration {
            Registration::Registered { id } => (true, id.clone()),
            Registration::AlreadyRegistered { id } => (false, id.clone()),
            Registration::ConflictSkipped { .. } => (false, String::new()),
        };
        Self {
            name: report.name.clone(),
            udid: report.udid.clone(),
            outcome: output::outcome(report.registration.label(), changed, color),
            id,
        }
    }
}

#[derive(Tabled)]
pub struct ReconciledRow {
    #[tabled(rename = "Profile")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub profile_type: String,
    #[tabled(rename = "New ID")]
    pub id: String,
    #[tabled(rename = "UUID")]
    pub uuid: String,
    #[tabled(rename = "Certs")]
    pub certificates: usize,
    #[tabled(rename = "Devices")]
    pub devices: usize,
}

impl From<&ReconcileSummary> for ReconciledRow {
    fn from(s: &ReconcileSummary) -> Self {
        Self {
            name: s.name.clone(),
            profile_type: s.profile_type.clone(),
            id: s.id.clone(),
            uuid: s.uuid.clone(),
            certificates: s.certificates,
            devices: s.devices,
        }
    }
}

#[derive(Tabled)]
pub struct InstalledRow {
    #[tabled(rename = "Profile")]
    pub name: String,
    #[tabled(rename = "UUID")]
    pub uuid: String,
    #[tabled(rename = "Path")]
    pub path: String,
}

impl From<&Installed> for InstalledRow {
    fn from(i: &Installed) -> Self {
        Self {
            name: i.name.clone(),
            uuid: i.uuid.clone(),
            path: i.path.display().to_string(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Where profiles get installed: `--profiles-dir` or the user's
/// MobileDevice directory.
pub fn profile_store(target: &InstallTarget) -> Result<ProfileStore, CliError> {
    let dir: PathBuf = match target.profiles_dir {
        Some(ref dir) => dir.clone(),
        None => ProfileStore::default_dir().ok_or_else(|| CliError::Validation {
            field: "profiles_dir".into(),
            reason: "cannot determine the home directory; pass --profiles-dir".into(),
        })?,
    };
    Ok(ProfileStore::new(dir))
}

/// Trim, drop duplicates (first occurrence wins) and reject blank names.
pub fn dedup_names(names: Vec<String>) -> Result<Vec<String>, CliError> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(CliError::Validation {
                field: "profile".into(),
                reason: "profile name cannot be empty".into(),
            });
        }
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}
