// ── Reconciliation run ──
//
// The fixed sequence: register devices → discover profiles in the
// archive → reconcile each iOS profile → install every discovered
// profile. Each step completes before the next begins and the first
// fatal error ends the run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::installer::{Installed, ProfileInstaller};
use crate::local::{InspectedProfile, ProfileInspector, discover_profiles, unique_names};
use crate::model::Device;
use crate::reconciler::{ProfileReconciler, ReconcileOutcome};
use crate::registrar::{DeviceRegistrar, Registration};
use crate::remote::{CertificateSource, DeviceRegistry, ProfileCatalog, ProfileDownload, ProfileWriter};

/// Page sizes and switches for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub device_page_limit: u32,
    pub certificate_page_limit: u32,
    /// Scope device listings by UDID on the portal side during registration.
    pub udid_filter: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            device_page_limit: crate::registrar::DEFAULT_DEVICE_PAGE_LIMIT,
            certificate_page_limit: crate::certificates::DEFAULT_CERTIFICATE_PAGE_LIMIT,
            udid_filter: false,
        }
    }
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub name: String,
    pub udid: String,
    #[serde(flatten)]
    pub registration: Registration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredProfile {
    pub path: PathBuf,
    pub name: String,
    pub ios: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub name: String,
    pub previous_id: String,
    pub id: String,
    pub uuid: String,
    pub profile_type: String,
    pub certificates: usize,
    pub devices: usize,
}

impl From<&ReconcileOutcome> for ReconcileSummary {
    fn from(o: &ReconcileOutcome) -> Self {
        Self {
            name: o.name.clone(),
            previous_id: o.previous_id.clone(),
            id: o.profile.id.clone(),
            uuid: o.profile.uuid.clone(),
            profile_type: o.profile.profile_type.to_string(),
            certificates: o.certificate_ids.len(),
            devices: o.device_ids.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub devices: Vec<DeviceReport>,
    pub discovered: Vec<DiscoveredProfile>,
    pub reconciled: Vec<ReconcileSummary>,
    pub installed: Vec<Installed>,
}

// ── Pipeline ─────────────────────────────────────────────────────────

pub struct Pipeline<'a, R, I, W> {
    remote: &'a R,
    inspector: &'a I,
    writer: &'a W,
    options: RunOptions,
}

impl<'a, R, I, W> Pipeline<'a, R, I, W>
where
    R: DeviceRegistry + CertificateSource + ProfileCatalog + ProfileDownload,
    I: ProfileInspector,
    W: ProfileWriter,
{
    pub fn new(remote: &'a R, inspector: &'a I, writer: &'a W, options: RunOptions) -> Self {
        Self {
            remote,
            inspector,
            writer,
            options,
        }
    }

    fn reconciler(&self) -> ProfileReconciler<'a, R> {
        ProfileReconciler::new(self.remote)
            .with_certificate_page_limit(self.options.certificate_page_limit)
            .with_device_page_limit(self.options.device_page_limit)
    }

    /// The whole run against the profiles embedded in `archive`.
    pub async fn run(&self, devices: &[Device], archive: &Path) -> Result<RunReport, CoreError> {
        let devices = self.register_devices(devices).await?;

        let inspected = self.discover(archive).await?;
        let ios_names: Vec<String> = unique_names(
            &inspected
                .iter()
                .filter(|p| {
                    if !p.is_ios() {
                        warn!(name = %p.name, path = %p.path.display(), "profile platform is not iOS, skipping reconciliation");
                    }
                    p.is_ios()
                })
                .cloned()
                .collect::<Vec<_>>(),
        );
        let all_names = unique_names(&inspected);

        let reconciled = self.reconcile_profiles(&ios_names).await?;
        let installed = self.install_profiles(&all_names).await?;

        Ok(RunReport {
            devices,
            discovered: inspected
                .into_iter()
                .map(|p| DiscoveredProfile {
                    ios: p.is_ios(),
                    path: p.path,
                    name: p.name,
                })
                .collect(),
            reconciled: reconciled.iter().map(ReconcileSummary::from).collect(),
            installed,
        })
    }

    pub async fn register_devices(&self, devices: &[Device]) -> Result<Vec<DeviceReport>, CoreError> {
        let registrar = DeviceRegistrar::new(self.remote)
            .with_page_limit(self.options.device_page_limit)
            .with_udid_filter(self.options.udid_filter);

        let outcomes = registrar.register_all(devices).await?;
        Ok(outcomes
            .into_iter()
            .map(|(device, registration)| DeviceReport {
                name: device.name,
                udid: device.udid.to_string(),
                registration,
            })
            .collect())
    }

    /// Inspect every embedded profile under `archive`.
    pub async fn discover(&self, archive: &Path) -> Result<Vec<InspectedProfile>, CoreError> {
        let paths = discover_profiles(archive).await?;
        info!(count = paths.len(), archive = %archive.display(), "discovered embedded profiles");

        let mut inspected = Vec::with_capacity(paths.len());
        for path in paths {
            let profile = self.inspector.inspect(&path).await?;
            info!(name = %profile.name, path = %path.display(), "provisioning profile located");
            inspected.push(profile);
        }
        Ok(inspected)
    }

    /// Reconcile each named profile in order.
    pub async fn reconcile_profiles(&self, names: &[String]) -> Result<Vec<ReconcileOutcome>, CoreError> {
        let reconciler = self.reconciler();
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            info!(name = %name, "updating provisioning profile on the developer portal");
            outcomes.push(reconciler.reconcile(name).await?);
        }
        Ok(outcomes)
    }

    /// Install the current portal version of each named profile.
    pub async fn install_profiles(&self, names: &[String]) -> Result<Vec<Installed>, CoreError> {
        let reconciler = self.reconciler();
        let installer = ProfileInstaller::new(self.remote, self.writer);
        let mut installed = Vec::with_capacity(names.len());
        for name in names {
            let profile = reconciler.locate_profile(name).await?;
            installed.push(installer.install(&profile).await?);
        }
        Ok(installed)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fake::{Call, FakePortal, MemoryWriter, profile};

    /// Answers from a table keyed by the profile's parent directory name.
    struct TableInspector(HashMap<String, (String, String)>);

    impl ProfileInspector for TableInspector {
        async fn inspect(&self, path: &Path) -> Result<InspectedProfile, CoreError> {
            let key = path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (name, platform) = self.0.get(&key).cloned().ok_or_else(|| CoreError::Inspection {
                path: path.display().to_string(),
                reason: "unknown".into(),
            })?;
            Ok(InspectedProfile {
                path: path.to_path_buf(),
                name,
                platform,
            })
        }
    }

    fn archive(bundles: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for bundle in bundles {
            let bundle_dir = dir.path().join(bundle);
            std::fs::create_dir_all(&bundle_dir).unwrap();
            std::fs::write(bundle_dir.join("embedded.mobileprovision"), b"cms").unwrap();
        }
        dir
    }

    fn inspector() -> TableInspector {
        let ios = "Array {\n    iOS\n}".to_owned();
        TableInspector(HashMap::from([
            ("MyApp.app".to_owned(), ("MyApp Dev".to_owned(), ios.clone())),
            ("Widget.appex".to_owned(), ("MyApp Dev".to_owned(), ios)),
            (
                "MyMac.app".to_owned(),
                ("MyApp Mac".to_owned(), "Array {\n    OSX\n}".to_owned()),
            ),
        ]))
    }

    fn portal() -> FakePortal {
        let portal = FakePortal::my_app();
        portal
            .profiles
            .borrow_mut()
            .push(profile("PM", "MyApp Mac", "MAC_APP_DEVELOPMENT", "com.example.app"));
        portal
    }

    #[tokio::test]
    async fn full_run_registers_reconciles_and_installs() {
        let portal = portal();
        let writer = MemoryWriter::default();
        let inspector = inspector();
        let dir = archive(&["MyApp.app", "MyApp.app/Widget.appex", "MyMac.app"]);
        let device = Device::new("QA iPhone", "00008030-NEW", "iOS");

        let report = Pipeline::new(&portal, &inspector, &writer, RunOptions::default())
            .run(std::slice::from_ref(&device), dir.path())
            .await
            .unwrap();

        assert!(matches!(
            report.devices[0].registration,
            Registration::Registered { .. }
        ));
        assert_eq!(report.discovered.len(), 3);

        // The shared profile is reconciled once; the macOS one is not.
        assert_eq!(report.reconciled.len(), 1);
        let summary = &report.reconciled[0];
        assert_eq!(summary.name, "MyApp Dev");
        assert_eq!(summary.previous_id, "P1");
        assert_eq!(summary.certificates, 2);
        // Five iOS-class devices plus the newly registered one.
        assert_eq!(summary.devices, 6);

        let installed: Vec<&str> = report.installed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(installed, vec!["MyApp Dev", "MyApp Mac"]);
        assert_eq!(report.installed[0].uuid, summary.uuid);
    }

    #[tokio::test]
    async fn registration_completes_before_profiles_are_touched() {
        let portal = portal();
        let writer = MemoryWriter::default();
        let inspector = inspector();
        let dir = archive(&["MyApp.app"]);
        let device = Device::new("QA iPhone", "00008030-NEW", "iOS");

        Pipeline::new(&portal, &inspector, &writer, RunOptions::default())
            .run(&[device], dir.path())
            .await
            .unwrap();

        let calls = portal.calls();
        let create = calls
            .iter()
            .position(|c| matches!(c, Call::CreateDevice { .. }))
            .unwrap();
        let first_profile = calls
            .iter()
            .position(|c| matches!(c, Call::FindProfiles(_)))
            .unwrap();
        assert!(create < first_profile);
    }

    #[tokio::test]
    async fn registration_failure_stops_the_run() {
        let portal = portal();
        portal.fail_create_device.set(true);
        let writer = MemoryWriter::default();
        let inspector = inspector();
        let dir = archive(&["MyApp.app"]);
        let device = Device::new("QA iPhone", "00008030-NEW", "iOS");

        let err = Pipeline::new(&portal, &inspector, &writer, RunOptions::default())
            .run(&[device], dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Registration { .. }));
        assert_eq!(portal.count(|c| matches!(c, Call::FindProfiles(_))), 0);
        assert!(writer.written.borrow().is_empty());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let portal = portal();
        let writer = MemoryWriter::default();
        let inspector = inspector();
        let dir = archive(&["MyApp.app"]);
        let device = Device::new("QA iPhone", "00008030-NEW", "iOS");
        let pipeline = Pipeline::new(&portal, &inspector, &writer, RunOptions::default());

        let first = pipeline
            .run(std::slice::from_ref(&device), dir.path())
            .await
            .unwrap();
        let second = pipeline.run(&[device], dir.path()).await.unwrap();

        assert!(matches!(
            second.devices[0].registration,
            Registration::AlreadyRegistered { .. }
        ));
        assert_eq!(portal.count(|c| matches!(c, Call::CreateDevice { .. })), 1);

        let created = portal.created.borrow();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].device_ids, created[1].device_ids);
        assert_eq!(created[0].certificate_ids, created[1].certificate_ids);
        assert_ne!(first.reconciled[0].id, second.reconciled[0].id);
    }
}
