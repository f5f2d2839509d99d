// ── Local provisioning profile collaborators ──
//
// Finding embedded profiles in a build archive, reading their name and
// platform, and writing downloaded profiles where Xcode looks for them.

pub mod discovery;
pub mod inspect;
pub mod store;

pub use discovery::{EMBEDDED_PROFILE_NAME, discover_profiles};
pub use inspect::{InspectedProfile, ProfileInspector, SecurityCmsInspector, unique_names};
pub use store::ProfileStore;
