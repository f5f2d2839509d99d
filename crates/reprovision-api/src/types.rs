//! JSON:API request and response types for the App Store Connect
//! provisioning endpoints (`/v1/devices`, `/v1/profiles`, `/v1/bundleIds`,
//! `/v1/certificates`).
//!
//! Attribute names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Enumerated values (device class, profile type, platform) stay as raw
//! strings here; `reprovision-core` parses them into closed enums.

use serde::{Deserialize, Serialize};

// ── Documents ────────────────────────────────────────────────────────

/// Single-resource response document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub links: DocumentLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
}

/// Collection response document. `links.next` is the cursor: an absolute
/// URL for the following page, absent on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedDocument<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub links: PagedDocumentLinks,
    #[serde(default)]
    pub meta: Option<PagingMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagedDocumentLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingMeta {
    pub paging: Paging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paging {
    pub total: u64,
    pub limit: u32,
}

/// JSON:API error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<crate::error::ApiErrorMessage>,
}

// ── Relationships ────────────────────────────────────────────────────

/// A to-one or to-many relationship, reduced to its links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub links: RelationshipLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
    /// Absolute URL of the related resource(s).
    #[serde(default)]
    pub related: Option<String>,
}

/// Resource identifier object (`{ "type": ..., "id": ... }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLinkage {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceLinkage {
    pub fn new(kind: &str, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToOne {
    pub data: ResourceLinkage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToMany {
    pub data: Vec<ResourceLinkage>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Device resource, from `GET /v1/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResource {
    pub id: String,
    pub attributes: DeviceAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceAttributes {
    pub name: String,
    pub udid: String,
    /// One of: `APPLE_WATCH`, `IPAD`, `IPHONE`, `IPOD`, `APPLE_TV`, `MAC`.
    pub device_class: String,
    /// One of: `IOS`, `MAC_OS`.
    pub platform: String,
    /// One of: `ENABLED`, `DISABLED`.
    pub status: String,
    pub model: Option<String>,
    pub added_date: Option<String>,
}

/// Body of `POST /v1/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCreateRequest {
    pub data: DeviceCreateData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCreateData {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: DeviceCreateAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCreateAttributes {
    pub name: String,
    pub platform: String,
    pub udid: String,
}

impl DeviceCreateRequest {
    pub fn new(name: &str, platform: &str, udid: &str) -> Self {
        Self {
            data: DeviceCreateData {
                kind: "devices".into(),
                attributes: DeviceCreateAttributes {
                    name: name.into(),
                    platform: platform.into(),
                    udid: udid.into(),
                },
            },
        }
    }
}

// ── Certificates ─────────────────────────────────────────────────────

/// Certificate resource, from a profile's `certificates` related link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateResource {
    pub id: String,
    #[serde(default)]
    pub attributes: Option<CertificateAttributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateAttributes {
    pub name: Option<String>,
    pub certificate_type: Option<String>,
    pub display_name: Option<String>,
    pub serial_number: Option<String>,
    pub expiration_date: Option<String>,
}

// ── Bundle IDs ───────────────────────────────────────────────────────

/// Bundle ID resource, from `GET /v1/bundleIds` or a profile's
/// `bundleId` related link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleIdResource {
    pub id: String,
    pub attributes: BundleIdAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleIdAttributes {
    pub identifier: String,
    pub name: String,
    pub platform: String,
    pub seed_id: Option<String>,
}

// ── Profiles ─────────────────────────────────────────────────────────

/// Profile resource, from `GET /v1/profiles` or `POST /v1/profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResource {
    pub id: String,
    pub attributes: ProfileAttributes,
    #[serde(default)]
    pub relationships: ProfileRelationships,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileAttributes {
    pub name: String,
    pub platform: String,
    /// e.g. `IOS_APP_DEVELOPMENT`, `TVOS_APP_ADHOC`, `MAC_APP_STORE`.
    pub profile_type: String,
    /// `ACTIVE` or `INVALID`.
    pub profile_state: String,
    /// Base64-encoded signed profile.
    pub profile_content: Option<String>,
    pub uuid: String,
    pub created_date: Option<String>,
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRelationships {
    pub bundle_id: Relationship,
    pub certificates: Relationship,
    pub devices: Relationship,
}

/// Body of `POST /v1/profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCreateRequest {
    pub data: ProfileCreateData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCreateData {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: ProfileCreateAttributes,
    pub relationships: ProfileCreateRelationships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreateAttributes {
    pub name: String,
    pub profile_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreateRelationships {
    pub bundle_id: ToOne,
    pub certificates: ToMany,
    pub devices: ToMany,
}

impl ProfileCreateRequest {
    pub fn new(
        name: &str,
        profile_type: &str,
        bundle_id: &str,
        certificate_ids: &[String],
        device_ids: &[String],
    ) -> Self {
        let linkages = |kind: &str, ids: &[String]| ToMany {
            data: ids.iter().map(|id| ResourceLinkage::new(kind, id.as_str())).collect(),
        };

        Self {
            data: ProfileCreateData {
                kind: "profiles".into(),
                attributes: ProfileCreateAttributes {
                    name: name.into(),
                    profile_type: profile_type.into(),
                },
                relationships: ProfileCreateRelationships {
                    bundle_id: ToOne {
                        data: ResourceLinkage::new("bundleIds", bundle_id),
                    },
                    certificates: linkages("certificates", certificate_ids),
                    devices: linkages("devices", device_ids),
                },
            },
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_create_request_shape() {
        let req = ProfileCreateRequest::new(
            "MyApp Dev",
            "IOS_APP_DEVELOPMENT",
            "B1",
            &["C1".into()],
            &["D1".into(), "D2".into()],
        );

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "type": "profiles",
                    "attributes": { "name": "MyApp Dev", "profileType": "IOS_APP_DEVELOPMENT" },
                    "relationships": {
                        "bundleId": { "data": { "type": "bundleIds", "id": "B1" } },
                        "certificates": { "data": [ { "type": "certificates", "id": "C1" } ] },
                        "devices": { "data": [
                            { "type": "devices", "id": "D1" },
                            { "type": "devices", "id": "D2" }
                        ] }
                    }
                }
            })
        );
    }

    #[test]
    fn profile_resource_reads_relationship_links() {
        let raw = json!({
            "type": "profiles",
            "id": "P1",
            "attributes": {
                "name": "MyApp Dev",
                "platform": "IOS",
                "profileType": "IOS_APP_DEVELOPMENT",
                "profileState": "ACTIVE",
                "uuid": "0f1e2d3c-aaaa-bbbb-cccc-000000000001"
            },
            "relationships": {
                "bundleId": { "links": {
                    "self": "https://api.appstoreconnect.apple.com/v1/profiles/P1/relationships/bundleId",
                    "related": "https://api.appstoreconnect.apple.com/v1/profiles/P1/bundleId"
                } },
                "certificates": { "links": {
                    "related": "https://api.appstoreconnect.apple.com/v1/profiles/P1/certificates"
                } },
                "devices": {}
            }
        });

        let profile: ProfileResource = serde_json::from_value(raw).unwrap();
        assert_eq!(profile.attributes.profile_type, "IOS_APP_DEVELOPMENT");
        assert_eq!(
            profile.relationships.bundle_id.links.related.as_deref(),
            Some("https://api.appstoreconnect.apple.com/v1/profiles/P1/bundleId")
        );
        assert!(profile.relationships.devices.links.related.is_none());
        assert!(profile.attributes.profile_content.is_none());
    }
}
