//! Device registration and provisioning profile reconciliation.
//!
//! This crate owns the domain logic between `reprovision-api` and the CLI:
//!
//! - **[`DeviceRegistrar`]**: idempotently registers a test device,
//!   deciding per device on a case- and separator-insensitive UDID match.
//!
//! - **[`ProfileReconciler`]**: rebuilds a profile by exact name. Reads the
//!   bundle ID, certificates and eligible devices, then deletes and
//!   recreates the profile. A failed recreate surfaces as
//!   [`CoreError::ProfileLost`].
//!
//! - **[`Paginator`]**: cursor-following enumerator used by every listing.
//!
//! - **[`Pipeline`]**: the fixed run (register, discover, reconcile,
//!   install) producing a serializable [`RunReport`].
//!
//! Components depend on the narrow capability traits in [`remote`], which
//! [`AppStoreConnect`] implements over the HTTP client.

pub mod asc;
pub mod certificates;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod installer;
pub mod local;
pub mod model;
pub mod paginate;
pub mod pipeline;
pub mod reconciler;
pub mod registrar;
pub mod remote;

#[cfg(test)]
mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use asc::AppStoreConnect;
pub use certificates::CertificateCollector;
pub use credentials::{BrokeredKey, CiConnection, fetch_brokered_key, resolve_api_key};
pub use error::{CoreError, ReconcileStage};
pub use filter::is_eligible;
pub use installer::{Installed, ProfileInstaller};
pub use local::{InspectedProfile, ProfileInspector, ProfileStore, SecurityCmsInspector};
pub use paginate::Paginator;
pub use pipeline::{
    DeviceReport, DiscoveredProfile, Pipeline, ReconcileSummary, RunOptions, RunReport,
};
pub use reconciler::{ProfileReconciler, ReconcileOutcome};
pub use registrar::{DeviceRegistrar, Registration};
pub use remote::{DeviceQuery, Page, PageCursor};

pub use model::{
    BundleId, Certificate, Device, DeviceClass, NewProfile, PlatformKind, Profile, ProfileFamily,
    ProfileType, RemoteDevice, Udid,
};
