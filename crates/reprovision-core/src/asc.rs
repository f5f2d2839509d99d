// ── App Store Connect capability adapter ──
//
// Implements every remote capability trait over `AppStoreConnectClient`.
// Cursors are the absolute `links.next` URLs the API returns.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use reprovision_api::AppStoreConnectClient;
use reprovision_api::types::{DeviceCreateRequest, PagedDocument, ProfileCreateRequest};

use crate::error::CoreError;
use crate::model::{BundleId, Certificate, Device, NewProfile, Profile, RemoteDevice};
use crate::remote::{
    CertificateSource, DeviceListing, DeviceQuery, DeviceRegistry, Page, PageCursor,
    ProfileCatalog, ProfileDownload,
};

/// Page size used when resolving a bundle identifier.
const BUNDLE_ID_PAGE_LIMIT: u32 = 200;

/// The developer portal, seen through its REST API.
pub struct AppStoreConnect {
    client: AppStoreConnectClient,
}

impl AppStoreConnect {
    pub fn new(client: AppStoreConnectClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AppStoreConnectClient {
        &self.client
    }
}

fn into_page<R, T: From<R>>(doc: PagedDocument<R>) -> Page<T> {
    Page {
        items: doc.data.into_iter().map(T::from).collect(),
        next: doc.links.next,
    }
}

impl DeviceListing for AppStoreConnect {
    async fn list_devices(
        &self,
        query: &DeviceQuery,
        cursor: PageCursor,
    ) -> Result<Page<RemoteDevice>, CoreError> {
        let doc = match cursor {
            PageCursor::Start { limit } => {
                let platform = query.platform.api_value().ok_or_else(|| {
                    CoreError::ValidationFailed {
                        message: format!("cannot list devices for platform {}", query.platform),
                    }
                })?;
                self.client
                    .list_devices(platform, query.udid.as_deref(), limit)
                    .await?
            }
            PageCursor::Next(next) => self.client.next_page(&next).await?,
        };
        Ok(into_page(doc))
    }
}

impl DeviceRegistry for AppStoreConnect {
    async fn create_device(&self, device: &Device) -> Result<RemoteDevice, CoreError> {
        let platform = device
            .platform
            .api_value()
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!(
                    "device {} has unrecognized platform {}",
                    device.name, device.platform
                ),
            })?;
        let request = DeviceCreateRequest::new(&device.name, platform, device.udid.as_str());
        let doc = self.client.create_device(&request).await?;
        Ok(doc.data.into())
    }
}

impl CertificateSource for AppStoreConnect {
    async fn list_certificates(
        &self,
        related: &str,
        cursor: PageCursor,
    ) -> Result<Page<Certificate>, CoreError> {
        let doc = match cursor {
            PageCursor::Start { limit } => {
                self.client.list_related_certificates(related, limit).await?
            }
            PageCursor::Next(next) => self.client.next_page(&next).await?,
        };
        Ok(into_page(doc))
    }
}

impl ProfileCatalog for AppStoreConnect {
    async fn find_profiles(
        &self,
        name: &str,
        cursor: PageCursor,
    ) -> Result<Page<Profile>, CoreError> {
        let doc = match cursor {
            PageCursor::Start { limit } => self.client.list_profiles(name, limit).await?,
            PageCursor::Next(next) => self.client.next_page(&next).await?,
        };
        Ok(into_page(doc))
    }

    async fn bundle_identifier(&self, related: &str) -> Result<String, CoreError> {
        let doc = self.client.get_related_bundle_id(related).await?;
        Ok(doc.data.attributes.identifier)
    }

    async fn find_bundle_id(&self, identifier: &str) -> Result<BundleId, CoreError> {
        // The identifier filter is a prefix match, so walk every page.
        let mut doc = self
            .client
            .list_bundle_ids(identifier, BUNDLE_ID_PAGE_LIMIT)
            .await?;
        loop {
            if let Some(found) = doc
                .data
                .iter()
                .find(|b| b.attributes.identifier == identifier)
            {
                return Ok(found.clone().into());
            }
            match doc.links.next.take() {
                Some(next) => doc = self.client.next_page(&next).await?,
                None => break,
            }
        }
        Err(CoreError::NotFound {
            entity_type: "bundle ID".into(),
            identifier: identifier.to_owned(),
        })
    }

    async fn delete_profile(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.client.delete_profile(id).await?)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, CoreError> {
        let request = ProfileCreateRequest::new(
            &profile.name,
            profile.profile_type.as_str(),
            &profile.bundle_id,
            &profile.certificate_ids,
            &profile.device_ids,
        );
        let doc = self.client.create_profile(&request).await?;
        Ok(doc.data.into())
    }
}

impl ProfileDownload for AppStoreConnect {
    async fn download_profile(&self, profile: &Profile) -> Result<Vec<u8>, CoreError> {
        let content = match &profile.content {
            Some(content) => content.clone(),
            None => {
                debug!(id = %profile.id, "profile content not inline, fetching");
                let doc = self.client.get_profile(&profile.id).await?;
                doc.data
                    .attributes
                    .profile_content
                    .ok_or_else(|| CoreError::Install {
                        name: profile.name.clone(),
                        uuid: profile.uuid.clone(),
                        reason: "the portal returned no profile content".into(),
                    })?
            }
        };

        STANDARD
            .decode(content.trim())
            .map_err(|e| CoreError::Install {
                name: profile.name.clone(),
                uuid: profile.uuid.clone(),
                reason: format!("profile content is not valid base64: {e}"),
            })
    }
}
