// ── Device registrar ──
//
// Ensures a device is present in the portal's inventory. Each device is
// decided on its own UDID: list the platform's devices, compare with a
// normalized UDID, create only when nothing matches.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Device, PlatformKind};
use crate::paginate::Paginator;
use crate::remote::{DeviceQuery, DeviceRegistry};

/// Default page size for device listings.
pub const DEFAULT_DEVICE_PAGE_LIMIT: u32 = 200;

/// What registration did for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Registration {
    /// A device with an equivalent UDID already exists.
    AlreadyRegistered { id: String },
    /// A new device record was created.
    Registered { id: String },
    /// Creation raced with another registration and the portal reported
    /// a conflict. Treated as already present.
    ConflictSkipped { messages: Vec<String> },
}

impl Registration {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered { .. } => "already registered",
            Self::Registered { .. } => "registered",
            Self::ConflictSkipped { .. } => "skipped (conflict)",
        }
    }
}

pub struct DeviceRegistrar<'a, R> {
    remote: &'a R,
    page_limit: u32,
    udid_filter: bool,
}

impl<'a, R: DeviceRegistry> DeviceRegistrar<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            page_limit: DEFAULT_DEVICE_PAGE_LIMIT,
            udid_filter: false,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Also scope the listing by UDID on the portal side. The local
    /// normalized comparison still decides.
    #[must_use]
    pub fn with_udid_filter(mut self, enabled: bool) -> Self {
        self.udid_filter = enabled;
        self
    }

    /// Register `device` unless an equivalent UDID is already listed.
    ///
    /// Failures carry the device's name and UDID.
    pub async fn register_if_absent(&self, device: &Device) -> Result<Registration, CoreError> {
        self.register_inner(device)
            .await
            .map_err(|source| CoreError::Registration {
                name: device.name.clone(),
                udid: device.udid.to_string(),
                source: Box::new(source),
            })
    }

    /// Register every device in order, each decided independently.
    /// Stops at the first fatal error.
    pub async fn register_all(
        &self,
        devices: &[Device],
    ) -> Result<Vec<(Device, Registration)>, CoreError> {
        let mut outcomes = Vec::with_capacity(devices.len());
        for device in devices {
            let outcome = self.register_if_absent(device).await?;
            outcomes.push((device.clone(), outcome));
        }
        Ok(outcomes)
    }

    async fn register_inner(&self, device: &Device) -> Result<Registration, CoreError> {
        if device.platform == PlatformKind::Unknown {
            return Err(CoreError::ValidationFailed {
                message: "platform must be one of ios, macos, universal".into(),
            });
        }

        let query = DeviceQuery {
            platform: device.platform,
            udid: self.udid_filter.then(|| device.udid.as_str().to_owned()),
        };
        let q = &query;
        let existing = Paginator::new(self.page_limit)
            .collect(move |cursor| self.remote.list_devices(q, cursor))
            .await?;
        debug!(count = existing.len(), platform = %device.platform, "listed devices");

        if let Some(found) = existing.iter().find(|d| d.udid.matches(&device.udid)) {
            info!(name = %device.name, id = %found.id, "device already registered");
            return Ok(Registration::AlreadyRegistered {
                id: found.id.clone(),
            });
        }

        match self.remote.create_device(device).await {
            Ok(created) => {
                info!(name = %device.name, id = %created.id, "device registered");
                Ok(Registration::Registered { id: created.id })
            }
            Err(CoreError::Conflict { messages }) => {
                warn!(
                    name = %device.name,
                    udid = %device.udid,
                    "device registration conflicted, treating as already registered: {}",
                    messages.join("; ")
                );
                Ok(Registration::ConflictSkipped { messages })
            }
            Err(e) => Err(e),
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fake::{Call, FakePortal, remote_device};
    use crate::model::DeviceClass;

    fn portal_with(udids: &[&str]) -> FakePortal {
        let portal = FakePortal::new();
        *portal.devices.borrow_mut() = udids
            .iter()
            .enumerate()
            .map(|(i, u)| remote_device(&format!("D{i}"), u, DeviceClass::Iphone))
            .collect();
        portal
    }

    fn is_create(c: &Call) -> bool {
        matches!(c, Call::CreateDevice { .. })
    }

    #[tokio::test]
    async fn existing_udid_in_any_form_skips_creation() {
        let portal = portal_with(&["00008030001a2b3c4d5e6f70"]);
        let device = Device::new("QA iPhone", "00008030-001A2B3C4D5E6F70", "iOS");

        let outcome = DeviceRegistrar::new(&portal)
            .register_if_absent(&device)
            .await
            .unwrap();

        assert_eq!(outcome, Registration::AlreadyRegistered { id: "D0".into() });
        assert_eq!(portal.count(is_create), 0);
    }

    #[tokio::test]
    async fn absent_udid_is_created_once_unchanged() {
        let portal = portal_with(&["aaaa"]);
        let device = Device::new("QA iPhone", "00008030-001A2B3C4D5E6F70", "ios");

        let outcome = DeviceRegistrar::new(&portal)
            .register_if_absent(&device)
            .await
            .unwrap();

        assert!(matches!(outcome, Registration::Registered { .. }));
        let creates: Vec<Call> = portal.calls().into_iter().filter(is_create).collect();
        assert_eq!(
            creates,
            vec![Call::CreateDevice {
                udid: "00008030-001A2B3C4D5E6F70".into()
            }]
        );
    }

    #[tokio::test]
    async fn conflict_on_create_is_a_skip() {
        let portal = portal_with(&[]);
        portal.conflict_on_create_device.set(true);
        let device = Device::new("QA iPhone", "abc", "iOS");

        let outcome = DeviceRegistrar::new(&portal)
            .register_if_absent(&device)
            .await
            .unwrap();

        assert!(matches!(outcome, Registration::ConflictSkipped { .. }));
    }

    #[tokio::test]
    async fn other_failures_carry_device_context() {
        let portal = portal_with(&[]);
        portal.fail_create_device.set(true);
        let device = Device::new("QA iPhone", "abc", "iOS");

        let err = DeviceRegistrar::new(&portal)
            .register_if_absent(&device)
            .await
            .unwrap_err();

        match &err {
            CoreError::Registration { name, udid, source } => {
                assert_eq!(name, "QA iPhone");
                assert_eq!(udid, "abc");
                assert!(matches!(**source, CoreError::Api { status: 500, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_platform_fails_before_any_call() {
        let portal = portal_with(&[]);
        let device = Device::new("Pixel", "abc", "android");

        let err = DeviceRegistrar::new(&portal)
            .register_if_absent(&device)
            .await
            .unwrap_err();

        assert!(matches!(err.root(), CoreError::ValidationFailed { .. }));
        assert!(portal.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_decisions_depend_only_on_each_udid() {
        let portal = portal_with(&["present-1"]);
        let devices = [
            Device::new("Known", "PRESENT-1", "iOS"),
            Device::new("New", "absent-2", "iOS"),
        ];

        let outcomes = DeviceRegistrar::new(&portal)
            .register_all(&devices)
            .await
            .unwrap();

        assert!(matches!(outcomes[0].1, Registration::AlreadyRegistered { .. }));
        assert!(matches!(outcomes[1].1, Registration::Registered { .. }));
        assert_eq!(portal.count(is_create), 1);
    }

    #[tokio::test]
    async fn udid_filter_is_forwarded_when_enabled() {
        let portal = portal_with(&["abc"]);
        let device = Device::new("QA", "abc", "iOS");

        DeviceRegistrar::new(&portal)
            .with_udid_filter(true)
            .register_if_absent(&device)
            .await
            .unwrap();

        assert_eq!(
            portal.calls()[0],
            Call::ListDevices {
                udid: Some("abc".into())
            }
        );
    }

    #[tokio::test]
    async fn paginates_the_inventory() {
        let udids: Vec<String> = (0..5).map(|i| format!("udid-{i}")).collect();
        let refs: Vec<&str> = udids.iter().map(String::as_str).collect();
        let portal = portal_with(&refs);
        let device = Device::new("Last", "UDID-4", "iOS");

        let outcome = DeviceRegistrar::new(&portal)
            .with_page_limit(2)
            .register_if_absent(&device)
            .await
            .unwrap();

        assert_eq!(outcome, Registration::AlreadyRegistered { id: "D4".into() });
        assert_eq!(portal.count(|c| matches!(c, Call::ListDevices { .. })), 3);
    }
}
