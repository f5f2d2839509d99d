// ── Device domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

// ── PlatformKind ────────────────────────────────────────────────────

/// Normalized device platform.
///
/// Parsed case-insensitively from free text. Anything unrecognized is
/// [`Unknown`](Self::Unknown); it never falls back to iOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    Ios,
    MacOs,
    Universal,
    Unknown,
}

impl PlatformKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" => Self::Ios,
            "macos" => Self::MacOs,
            "universal" => Self::Universal,
            _ => Self::Unknown,
        }
    }

    /// The authority's platform value, or `None` for [`Unknown`](Self::Unknown).
    pub fn api_value(self) -> Option<&'static str> {
        match self {
            Self::Ios => Some("IOS"),
            Self::MacOs => Some("MAC_OS"),
            Self::Universal => Some("UNIVERSAL"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ios => "iOS",
            Self::MacOs => "macOS",
            Self::Universal => "universal",
            Self::Unknown => "unknown",
        })
    }
}

// ── Udid ────────────────────────────────────────────────────────────

/// A device UDID exactly as entered.
///
/// Equality with [`matches`](Self::matches) ignores case and separators,
/// the same way the authority recognizes existing devices. The raw value
/// is what gets sent on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Udid(String);

impl Udid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase alphanumerics only: `00008030-001A` → `00008030001a`.
    pub fn normalized(&self) -> String {
        self.0
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    pub fn matches(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for Udid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Udid {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Device (local) ──────────────────────────────────────────────────

/// The test device to register, from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub udid: Udid,
    pub platform: PlatformKind,
}

impl Device {
    pub fn new(name: impl Into<String>, udid: impl Into<String>, platform: &str) -> Self {
        Self {
            name: name.into(),
            udid: Udid::new(udid),
            platform: PlatformKind::parse(platform),
        }
    }
}

// ── DeviceClass ─────────────────────────────────────────────────────

/// Hardware category reported by the authority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceClass {
    Iphone,
    Ipad,
    Ipod,
    AppleWatch,
    AppleTv,
    Mac,
    Unknown,
}

impl DeviceClass {
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

// ── RemoteDevice ────────────────────────────────────────────────────

/// A device record owned by the authority. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDevice {
    pub id: String,
    pub name: String,
    pub udid: Udid,
    pub device_class: DeviceClass,
    /// Raw platform value (`IOS`, `MAC_OS`).
    pub platform: String,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parse_is_case_insensitive() {
        for raw in ["iOS", "IOS", "ios", " ios "] {
            assert_eq!(PlatformKind::parse(raw), PlatformKind::Ios, "{raw}");
        }
        assert_eq!(PlatformKind::parse("MacOS"), PlatformKind::MacOs);
        assert_eq!(PlatformKind::parse("Universal"), PlatformKind::Universal);
    }

    #[test]
    fn unrecognized_platform_is_unknown() {
        assert_eq!(PlatformKind::parse("android"), PlatformKind::Unknown);
        assert_eq!(PlatformKind::parse(""), PlatformKind::Unknown);
        assert_eq!(PlatformKind::parse("tvos"), PlatformKind::Unknown);
        assert_eq!(PlatformKind::Unknown.api_value(), None);
    }

    #[test]
    fn udid_matches_across_case_and_separators() {
        let entered = Udid::from("00008030-001A2B3C4D5E6F70");
        assert!(entered.matches(&Udid::from("00008030001a2b3c4d5e6f70")));
        assert!(entered.matches(&Udid::from("00008030-001a2b3c4d5e6f70")));
        assert!(!entered.matches(&Udid::from("00008030-001A2B3C4D5E6F71")));
    }

    #[test]
    fn udid_keeps_raw_value() {
        let udid = Udid::from("00008030-001A");
        assert_eq!(udid.as_str(), "00008030-001A");
        assert_eq!(udid.normalized(), "00008030001a");
    }

    #[test]
    fn device_class_parses_api_values() {
        assert_eq!(DeviceClass::parse("APPLE_TV"), DeviceClass::AppleTv);
        assert_eq!(DeviceClass::parse("APPLE_WATCH"), DeviceClass::AppleWatch);
        assert_eq!(DeviceClass::parse("IPHONE"), DeviceClass::Iphone);
        assert_eq!(DeviceClass::parse("VISION_PRO"), DeviceClass::Unknown);
        assert_eq!(DeviceClass::AppleTv.to_string(), "APPLE_TV");
    }
}
