// ── Device class filter ──
//
// Which authority devices may be included when rebuilding a profile.
// Pure predicate: (profile family) × (device class), nothing else.

use crate::model::{DeviceClass, ProfileFamily, ProfileType};

/// Returns `true` if a device of `class` belongs in a profile of `profile_type`.
///
/// Unrecognized families include nothing.
pub fn is_eligible(profile_type: &ProfileType, class: DeviceClass) -> bool {
    match profile_type.family() {
        ProfileFamily::Tvos => class == DeviceClass::AppleTv,
        ProfileFamily::Ios => matches!(
            class,
            DeviceClass::Iphone | DeviceClass::Ipad | DeviceClass::Ipod | DeviceClass::AppleWatch
        ),
        ProfileFamily::Mac | ProfileFamily::MacCatalyst | ProfileFamily::Unknown => false,
    }
}
