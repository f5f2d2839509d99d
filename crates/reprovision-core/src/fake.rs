// In-memory developer portal for component tests.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use crate::error::CoreError;
use crate::model::{
    BundleId, Certificate, Device, DeviceClass, NewProfile, Profile, ProfileLinks, ProfileType,
    RemoteDevice, Udid,
};
use crate::remote::{
    CertificateSource, DeviceListing, DeviceQuery, DeviceRegistry, Page, PageCursor,
    ProfileCatalog, ProfileDownload, ProfileWriter,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDevices { udid: Option<String> },
    CreateDevice { udid: String },
    ListCertificates,
    FindProfiles(String),
    BundleIdentifier,
    FindBundleId(String),
    DeleteProfile(String),
    CreateProfile(String),
    Download(String),
}

#[derive(Default)]
pub struct FakePortal {
    pub devices: RefCell<Vec<RemoteDevice>>,
    pub certificates: Vec<Certificate>,
    pub bundle_ids: Vec<BundleId>,
    pub profiles: RefCell<Vec<Profile>>,
    pub created: RefCell<Vec<NewProfile>>,
    pub calls: RefCell<Vec<Call>>,
    /// Every `create_device` answers 409.
    pub conflict_on_create_device: Cell<bool>,
    /// Every `create_device` answers 500.
    pub fail_create_device: Cell<bool>,
    pub fail_create_profile: Cell<bool>,
    pub fail_certificates: Cell<bool>,
    pub next_id: Cell<u32>,
}

pub fn remote_device(id: &str, udid: &str, class: DeviceClass) -> RemoteDevice {
    RemoteDevice {
        id: id.into(),
        name: format!("device {id}"),
        udid: Udid::new(udid),
        device_class: class,
        platform: "IOS".into(),
        enabled: true,
    }
}

pub fn profile(id: &str, name: &str, profile_type: &str, bundle: &str) -> Profile {
    Profile {
        id: id.into(),
        name: name.into(),
        profile_type: ProfileType::new(profile_type),
        uuid: format!("UUID-{id}"),
        platform: "IOS".into(),
        active: true,
        expiration_date: None,
        content: None,
        links: ProfileLinks {
            bundle_id: Some(format!("bundle:{bundle}")),
            certificates: Some(format!("certificates:{id}")),
            devices: Some(format!("devices:{id}")),
        },
    }
}

impl FakePortal {
    pub fn new() -> Self {
        Self::default()
    }

    /// The "MyApp Dev" portal: one profile, two certificates, five
    /// iOS-class devices and one Apple TV.
    pub fn my_app() -> Self {
        let portal = Self {
            certificates: vec![
                Certificate { id: "C1".into() },
                Certificate { id: "C2".into() },
            ],
            bundle_ids: vec![
                BundleId {
                    id: "B0".into(),
                    identifier: "com.example.app.widget".into(),
                },
                BundleId {
                    id: "B1".into(),
                    identifier: "com.example.app".into(),
                },
            ],
            ..Self::default()
        };
        *portal.devices.borrow_mut() = vec![
            remote_device("D1", "00008030-000A1B2C3D4E5F60", DeviceClass::Iphone),
            remote_device("D2", "00008030-000A1B2C3D4E5F61", DeviceClass::Ipad),
            remote_device("D3", "00008030-000A1B2C3D4E5F62", DeviceClass::Ipod),
            remote_device("D4", "00008030-000A1B2C3D4E5F63", DeviceClass::AppleWatch),
            remote_device("D5", "00008030-000A1B2C3D4E5F64", DeviceClass::Iphone),
            remote_device("D6", "00008030-000A1B2C3D4E5F65", DeviceClass::AppleTv),
        ];
        *portal.profiles.borrow_mut() = vec![
            profile("P0", "MyApp", "IOS_APP_DEVELOPMENT", "com.example.app"),
            profile("P1", "MyApp Dev", "IOS_APP_DEVELOPMENT", "com.example.app"),
        ];
        portal
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fresh_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

/// Cursor format: `"<offset>:<limit>"`.
fn slice_page<T: Clone>(items: &[T], cursor: &PageCursor, default_limit: u32) -> Page<T> {
    let (offset, limit) = match cursor {
        PageCursor::Start { limit } => (0, *limit as usize),
        PageCursor::Next(next) => {
            let (offset, limit) = next.split_once(':').unwrap_or((next, ""));
            (
                offset.parse().unwrap_or(0),
                limit.parse().unwrap_or(default_limit as usize),
            )
        }
    };
    let limit = limit.max(1);
    let end = (offset + limit).min(items.len());
    Page {
        items: items[offset.min(end)..end].to_vec(),
        next: (end < items.len()).then(|| format!("{end}:{limit}")),
    }
}

fn api_error(status: u16) -> CoreError {
    CoreError::from(reprovision_api::Error::Api {
        status,
        errors: vec![reprovision_api::ApiErrorMessage {
            code: None,
            title: "Fake failure".into(),
            detail: format!("status {status}"),
        }],
    })
}

impl DeviceListing for FakePortal {
    async fn list_devices(
        &self,
        query: &DeviceQuery,
        cursor: PageCursor,
    ) -> Result<Page<RemoteDevice>, CoreError> {
        self.record(Call::ListDevices {
            udid: query.udid.clone(),
        });
        let platform = query.platform.api_value().unwrap_or_default();
        let wanted = query.udid.as_deref().map(Udid::new);
        let matching: Vec<RemoteDevice> = self
            .devices
            .borrow()
            .iter()
            .filter(|d| d.platform == platform)
            .filter(|d| wanted.as_ref().is_none_or(|u| d.udid.matches(u)))
            .cloned()
            .collect();
        Ok(slice_page(&matching, &cursor, 20))
    }
}

impl DeviceRegistry for FakePortal {
    async fn create_device(&self, device: &Device) -> Result<RemoteDevice, CoreError> {
        self.record(Call::CreateDevice {
            udid: device.udid.as_str().to_owned(),
        });
        if self.conflict_on_create_device.get() {
            return Err(api_error(409));
        }
        if self.fail_create_device.get() {
            return Err(api_error(500));
        }
        let created = RemoteDevice {
            id: format!("ND{}", self.fresh_id()),
            name: device.name.clone(),
            udid: device.udid.clone(),
            device_class: DeviceClass::Iphone,
            platform: device.platform.api_value().unwrap_or_default().to_owned(),
            enabled: true,
        };
        self.devices.borrow_mut().push(created.clone());
        Ok(created)
    }
}

impl CertificateSource for FakePortal {
    async fn list_certificates(
        &self,
        _related: &str,
        cursor: PageCursor,
    ) -> Result<Page<Certificate>, CoreError> {
        self.record(Call::ListCertificates);
        if self.fail_certificates.get() {
            return Err(api_error(500));
        }
        Ok(slice_page(&self.certificates, &cursor, 20))
    }
}

impl ProfileCatalog for FakePortal {
    async fn find_profiles(
        &self,
        name: &str,
        cursor: PageCursor,
    ) -> Result<Page<Profile>, CoreError> {
        self.record(Call::FindProfiles(name.to_owned()));
        // Prefix match, like the real name filter can be.
        let matching: Vec<Profile> = self
            .profiles
            .borrow()
            .iter()
            .filter(|p| p.name.starts_with(name) || name.starts_with(&p.name))
            .cloned()
            .collect();
        Ok(slice_page(&matching, &cursor, 20))
    }

    async fn bundle_identifier(&self, related: &str) -> Result<String, CoreError> {
        self.record(Call::BundleIdentifier);
        related
            .strip_prefix("bundle:")
            .map(str::to_owned)
            .ok_or_else(|| api_error(404))
    }

    async fn find_bundle_id(&self, identifier: &str) -> Result<BundleId, CoreError> {
        self.record(Call::FindBundleId(identifier.to_owned()));
        self.bundle_ids
            .iter()
            .find(|b| b.identifier == identifier)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "bundle ID".into(),
                identifier: identifier.to_owned(),
            })
    }

    async fn delete_profile(&self, id: &str) -> Result<(), CoreError> {
        self.record(Call::DeleteProfile(id.to_owned()));
        let mut profiles = self.profiles.borrow_mut();
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Err(api_error(404));
        }
        Ok(())
    }

    async fn create_profile(&self, new: &NewProfile) -> Result<Profile, CoreError> {
        self.record(Call::CreateProfile(new.name.clone()));
        if self.fail_create_profile.get() {
            return Err(api_error(500));
        }
        let bundle = self
            .bundle_ids
            .iter()
            .find(|b| b.id == new.bundle_id)
            .map(|b| b.identifier.clone())
            .unwrap_or_default();
        let id = format!("NP{}", self.fresh_id());
        let mut created = profile(&id, &new.name, new.profile_type.as_str(), &bundle);
        created.content = Some("cHJvZmlsZQ==".into());
        self.profiles.borrow_mut().push(created.clone());
        self.created.borrow_mut().push(new.clone());
        Ok(created)
    }
}

impl ProfileDownload for FakePortal {
    async fn download_profile(&self, profile: &Profile) -> Result<Vec<u8>, CoreError> {
        self.record(Call::Download(profile.id.clone()));
        Ok(format!("signed {}", profile.uuid).into_bytes())
    }
}

/// Records writes instead of touching the filesystem.
#[derive(Default)]
pub struct MemoryWriter {
    pub written: RefCell<Vec<(String, Vec<u8>)>>,
    pub fail: Cell<bool>,
}

impl ProfileWriter for MemoryWriter {
    async fn write_profile(&self, profile: &Profile, content: &[u8]) -> Result<PathBuf, CoreError> {
        if self.fail.get() {
            return Err(CoreError::Install {
                name: profile.name.clone(),
                uuid: profile.uuid.clone(),
                reason: "disk full".into(),
            });
        }
        self.written
            .borrow_mut()
            .push((profile.uuid.clone(), content.to_vec()));
        Ok(PathBuf::from(format!("/profiles/{}.mobileprovision", profile.uuid)))
    }
}
