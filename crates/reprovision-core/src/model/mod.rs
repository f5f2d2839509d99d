// ── Domain model ──
//
// Canonical types shared by every component. Raw strings from the API
// are parsed into closed enums here, once, at the boundary.

pub mod device;
pub mod profile;

pub use device::{Device, DeviceClass, PlatformKind, RemoteDevice, Udid};
pub use profile::{BundleId, Certificate, NewProfile, Profile, ProfileFamily, ProfileLinks, ProfileType};
