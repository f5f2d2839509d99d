// ── Profile domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── ProfileType / ProfileFamily ─────────────────────────────────────

/// The authority's profile type, e.g. `IOS_APP_DEVELOPMENT`.
///
/// Kept verbatim so a recreated profile gets exactly the type it had.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileType(String);

/// Platform family, taken from the profile type's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileFamily {
    Ios,
    Tvos,
    Mac,
    MacCatalyst,
    Unknown,
}

impl ProfileType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn family(&self) -> ProfileFamily {
        let raw = self.0.as_str();
        if raw.starts_with("IOS_") {
            ProfileFamily::Ios
        } else if raw.starts_with("TVOS_") {
            ProfileFamily::Tvos
        } else if raw.starts_with("MAC_CATALYST_") {
            ProfileFamily::MacCatalyst
        } else if raw.starts_with("MAC_") {
            ProfileFamily::Mac
        } else {
            ProfileFamily::Unknown
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Certificate / BundleId ──────────────────────────────────────────

/// Only the identifier is needed to rebuild a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleId {
    pub id: String,
    pub identifier: String,
}

// ── Profile ─────────────────────────────────────────────────────────

/// Relationship links of a profile (absolute URLs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLinks {
    pub bundle_id: Option<String>,
    pub certificates: Option<String>,
    pub devices: Option<String>,
}

/// A provisioning profile as the authority reports it.
///
/// `id` and `uuid` change on every reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub profile_type: ProfileType,
    pub uuid: String,
    /// Raw platform value (`IOS`, `MAC_OS`).
    pub platform: String,
    pub active: bool,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Base64-encoded signed content, when the response carried it.
    #[serde(skip)]
    pub content: Option<String>,
    #[serde(skip)]
    pub links: ProfileLinks,
}

/// Everything needed to create a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub name: String,
    pub profile_type: ProfileType,
    pub bundle_id: String,
    pub certificate_ids: Vec<String>,
    pub device_ids: Vec<String>,
}
