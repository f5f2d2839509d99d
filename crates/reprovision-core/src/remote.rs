// ── Remote authority capabilities ──
//
// The narrow operation sets each component depends on. Components take
// a reference to something implementing only what they call; the App
// Store Connect adapter (`crate::asc`) implements all of them, and tests
// substitute in-memory fakes.

#![allow(async_fn_in_trait)]

use crate::error::CoreError;
use crate::model::{BundleId, Certificate, Device, NewProfile, PlatformKind, Profile, RemoteDevice};

/// One page of a listing, with the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque continuation; `None` on the last page.
    pub next: Option<String>,
}

/// Where a page fetch starts: the initial request, or a previous
/// page's continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Start { limit: u32 },
    Next(String),
}

/// Filter for device listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    pub platform: PlatformKind,
    pub udid: Option<String>,
}

/// Read access to the device inventory.
pub trait DeviceListing {
    async fn list_devices(
        &self,
        query: &DeviceQuery,
        cursor: PageCursor,
    ) -> Result<Page<RemoteDevice>, CoreError>;
}

/// Write access to the device inventory.
pub trait DeviceRegistry: DeviceListing {
    /// Create a device. An existing UDID yields [`CoreError::Conflict`].
    async fn create_device(&self, device: &Device) -> Result<RemoteDevice, CoreError>;
}

/// Certificates reachable through a profile's relationship link.
pub trait CertificateSource {
    async fn list_certificates(
        &self,
        related: &str,
        cursor: PageCursor,
    ) -> Result<Page<Certificate>, CoreError>;
}

/// Profile and bundle ID operations.
pub trait ProfileCatalog {
    /// One page of profiles whose name matches `name` on the authority
    /// side, which may include partial matches.
    async fn find_profiles(
        &self,
        name: &str,
        cursor: PageCursor,
    ) -> Result<Page<Profile>, CoreError>;

    /// Follow a profile's `bundleId` link to the identifier string.
    async fn bundle_identifier(&self, related: &str) -> Result<String, CoreError>;

    /// Resolve an identifier (`com.example.app`) to its record.
    async fn find_bundle_id(&self, identifier: &str) -> Result<BundleId, CoreError>;

    async fn delete_profile(&self, id: &str) -> Result<(), CoreError>;

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, CoreError>;
}

/// Download a profile's signed content.
pub trait ProfileDownload {
    async fn download_profile(&self, profile: &Profile) -> Result<Vec<u8>, CoreError>;
}

/// Persist a downloaded profile where the OS expects it.
pub trait ProfileWriter {
    /// Returns the path written.
    async fn write_profile(
        &self,
        profile: &Profile,
        content: &[u8],
    ) -> Result<std::path::PathBuf, CoreError>;
}
