// ── Profile reconciler ──
//
// Rebuilds one provisioning profile so it carries every eligible device:
//
//   locate → resolve bundle ID → collect certificates → collect devices
//          → delete → recreate
//
// Every read happens before the delete, so the window in which no profile
// of that name exists spans only the create call. A create failure after
// the delete is reported as `CoreError::ProfileLost`.

use serde::Serialize;
use tracing::{error, info};

use crate::certificates::{CertificateCollector, DEFAULT_CERTIFICATE_PAGE_LIMIT};
use crate::error::{CoreError, ReconcileStage};
use crate::filter::is_eligible;
use crate::model::{BundleId, NewProfile, PlatformKind, Profile, ProfileFamily};
use crate::paginate::Paginator;
use crate::registrar::DEFAULT_DEVICE_PAGE_LIMIT;
use crate::remote::{CertificateSource, DeviceListing, DeviceQuery, ProfileCatalog};

pub const DEFAULT_PROFILE_PAGE_LIMIT: u32 = 200;

/// The result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub name: String,
    pub previous_id: String,
    pub previous_uuid: String,
    /// The recreated profile; its id and UUID are new.
    pub profile: Profile,
    pub bundle_id: BundleId,
    pub certificate_ids: Vec<String>,
    pub device_ids: Vec<String>,
}

/// Everything read before the destructive step.
struct Membership {
    bundle_id: BundleId,
    certificate_ids: Vec<String>,
    device_ids: Vec<String>,
}

pub struct ProfileReconciler<'a, R> {
    remote: &'a R,
    profile_page_limit: u32,
    certificate_page_limit: u32,
    device_page_limit: u32,
}

impl<'a, R> ProfileReconciler<'a, R>
where
    R: ProfileCatalog + CertificateSource + DeviceListing,
{
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            profile_page_limit: DEFAULT_PROFILE_PAGE_LIMIT,
            certificate_page_limit: DEFAULT_CERTIFICATE_PAGE_LIMIT,
            device_page_limit: DEFAULT_DEVICE_PAGE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_profile_page_limit(mut self, limit: u32) -> Self {
        self.profile_page_limit = limit;
        self
    }

    #[must_use]
    pub fn with_certificate_page_limit(mut self, limit: u32) -> Self {
        self.certificate_page_limit = limit;
        self
    }

    #[must_use]
    pub fn with_device_page_limit(mut self, limit: u32) -> Self {
        self.device_page_limit = limit;
        self
    }

    /// Find the profile whose name is exactly `name`.
    ///
    /// The portal's name filter can return partial matches, which are
    /// discarded here.
    pub async fn locate_profile(&self, name: &str) -> Result<Profile, CoreError> {
        Paginator::new(self.profile_page_limit)
            .find(
                |cursor| self.remote.find_profiles(name, cursor),
                |p: &Profile| p.name == name,
            )
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "profile".into(),
                identifier: name.to_owned(),
            })
    }

    /// Delete and recreate the profile named `name` with the current
    /// certificates and every eligible device.
    pub async fn reconcile(&self, name: &str) -> Result<ReconcileOutcome, CoreError> {
        let current = self.locate_profile(name).await?;
        info!(name, id = %current.id, uuid = %current.uuid, "located profile");

        let wrap = |stage: ReconcileStage| {
            let uuid = current.uuid.clone();
            move |source: CoreError| CoreError::Reconcile {
                name: name.to_owned(),
                uuid,
                stage,
                source: Box::new(source),
            }
        };

        let family = current.profile_type.family();
        if !matches!(family, ProfileFamily::Ios | ProfileFamily::Tvos) {
            return Err(wrap(ReconcileStage::Locate)(CoreError::ValidationFailed {
                message: format!(
                    "profile type {} is not an iOS or tvOS type",
                    current.profile_type
                ),
            }));
        }

        let membership = self.read_membership(&current, &wrap).await?;

        self.remote
            .delete_profile(&current.id)
            .await
            .map_err(wrap(ReconcileStage::Delete))?;
        info!(name, id = %current.id, "deleted profile");

        let request = NewProfile {
            name: name.to_owned(),
            profile_type: current.profile_type.clone(),
            bundle_id: membership.bundle_id.id.clone(),
            certificate_ids: membership.certificate_ids,
            device_ids: membership.device_ids,
        };

        let created = match self.remote.create_profile(&request).await {
            Ok(created) => created,
            Err(source) => {
                error!(
                    name,
                    previous_id = %current.id,
                    "profile deleted but recreation failed; it no longer exists on the portal"
                );
                return Err(CoreError::ProfileLost {
                    name: name.to_owned(),
                    uuid: current.uuid,
                    previous_id: current.id,
                    source: Box::new(source),
                });
            }
        };
        info!(
            name,
            id = %created.id,
            uuid = %created.uuid,
            certificates = request.certificate_ids.len(),
            devices = request.device_ids.len(),
            "recreated profile"
        );

        Ok(ReconcileOutcome {
            name: name.to_owned(),
            previous_id: current.id,
            previous_uuid: current.uuid,
            profile: created,
            bundle_id: membership.bundle_id,
            certificate_ids: request.certificate_ids,
            device_ids: request.device_ids,
        })
    }

    async fn read_membership<W, F>(&self, current: &Profile, wrap: &W) -> Result<Membership, CoreError>
    where
        W: Fn(ReconcileStage) -> F,
        F: FnOnce(CoreError) -> CoreError,
    {
        let missing_link = |relationship: &str| CoreError::NotFound {
            entity_type: format!("{relationship} relationship"),
            identifier: current.name.clone(),
        };

        // Bundle ID
        let bundle_link = current
            .links
            .bundle_id
            .as_deref()
            .ok_or_else(|| missing_link("bundleId"))
            .map_err(wrap(ReconcileStage::ResolveBundleId))?;
        let identifier = self
            .remote
            .bundle_identifier(bundle_link)
            .await
            .map_err(wrap(ReconcileStage::ResolveBundleId))?;
        let bundle_id = self
            .remote
            .find_bundle_id(&identifier)
            .await
            .map_err(wrap(ReconcileStage::ResolveBundleId))?;

        // Certificates
        let certificate_link = current
            .links
            .certificates
            .as_deref()
            .ok_or_else(|| missing_link("certificates"))
            .map_err(wrap(ReconcileStage::CollectCertificates))?;
        let certificate_ids = CertificateCollector::new(self.remote)
            .with_page_limit(self.certificate_page_limit)
            .collect_ids(certificate_link)
            .await
            .map_err(wrap(ReconcileStage::CollectCertificates))?;

        // Devices: the iOS inventory holds tvOS and watchOS hardware too.
        let query = DeviceQuery {
            platform: PlatformKind::Ios,
            udid: None,
        };
        let q = &query;
        let devices = Paginator::new(self.device_page_limit)
            .collect(move |cursor| self.remote.list_devices(q, cursor))
            .await
            .map_err(wrap(ReconcileStage::CollectDevices))?;
        let device_ids: Vec<String> = devices
            .into_iter()
            .filter(|d| is_eligible(&current.profile_type, d.device_class))
            .map(|d| d.id)
            .collect();

        Ok(Membership {
            bundle_id,
            certificate_ids,
            device_ids,
        })
    }
}
