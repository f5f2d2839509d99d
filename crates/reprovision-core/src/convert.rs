// ── API-to-domain type conversions ──
//
// Bridges raw `reprovision_api` JSON:API resources into `crate::model`
// types. Device classes are parsed into the closed enum here; unknown
// classes survive as `DeviceClass::Unknown` rather than failing.

use chrono::{DateTime, Utc};

use reprovision_api::types::{
    BundleIdResource, CertificateResource, DeviceResource, ProfileResource,
};

use crate::model::{
    BundleId, Certificate, DeviceClass, Profile, ProfileLinks, ProfileType, RemoteDevice, Udid,
};

/// App Store Connect timestamps use `+0000` offsets, which are not RFC 3339.
fn parse_timestamp(raw: Option<&String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<DeviceResource> for RemoteDevice {
    fn from(r: DeviceResource) -> Self {
        let a = r.attributes;
        Self {
            id: r.id,
            name: a.name,
            udid: Udid::new(a.udid),
            device_class: DeviceClass::parse(&a.device_class),
            platform: a.platform,
            enabled: a.status == "ENABLED",
        }
    }
}

impl From<CertificateResource> for Certificate {
    fn from(r: CertificateResource) -> Self {
        Self { id: r.id }
    }
}

impl From<BundleIdResource> for BundleId {
    fn from(r: BundleIdResource) -> Self {
        Self {
            id: r.id,
            identifier: r.attributes.identifier,
        }
    }
}

impl From<ProfileResource> for Profile {
    fn from(r: ProfileResource) -> Self {
        let a = r.attributes;
        let rel = r.relationships;
        Self {
            id: r.id,
            name: a.name,
            profile_type: ProfileType::new(a.profile_type),
            uuid: a.uuid,
            platform: a.platform,
            active: a.profile_state == "ACTIVE",
            expiration_date: parse_timestamp(a.expiration_date.as_ref()),
            content: a.profile_content,
            links: ProfileLinks {
                bundle_id: rel.bundle_id.links.related,
                certificates: rel.certificates.links.related,
                devices: rel.devices.links.related,
            },
        }
    }
}
