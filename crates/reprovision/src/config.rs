//! CLI configuration: the shared `reprovision_config` layers plus flags.
//!
//! Flags (and their `REPROVISION_*` env vars) override the config file.
//! Everything that can be checked locally is checked here, before any
//! request leaves the machine.

use std::path::PathBuf;

use reprovision_api::AppStoreConnectClient;
use reprovision_core::{AppStoreConnect, Device, RunOptions};

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use reprovision_config::{Config, config_path, load_config, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Load the config file + environment, then apply global flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_global(&mut cfg, global);
    Ok(cfg)
}

/// Overlay global flags onto a loaded config. Flags win.
pub fn apply_global(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref v) = global.key_id {
        cfg.api.key_id = Some(v.clone());
    }
    if let Some(ref v) = global.issuer_id {
        cfg.api.issuer_id = Some(v.clone());
    }
    if let Some(ref v) = global.private_key_path {
        cfg.api.private_key_path = Some(v.clone());
    }
    if let Some(ref v) = global.base_url {
        cfg.api.base_url = Some(v.clone());
    }
    if let Some(ref v) = global.build_url {
        cfg.ci.build_url = Some(v.clone());
    }
    if let Some(ref v) = global.build_api_token {
        cfg.ci.build_api_token = Some(v.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }
}

/// The test device from flags over config, validated.
pub fn device(cfg: &Config, args: &DeviceArgs) -> Result<Device, CliError> {
    let mut settings = cfg.device.clone();
    if let Some(ref v) = args.device_name {
        settings.name = Some(v.clone());
    }
    if let Some(ref v) = args.device_udid {
        settings.udid = Some(v.clone());
    }
    if let Some(ref v) = args.device_platform {
        settings.platform.clone_from(v);
    }
    Ok(reprovision_config::device(&settings)?)
}

/// The archive to scan. It must exist and be a directory.
pub fn archive_path(cfg: &Config, flag: Option<&PathBuf>) -> Result<PathBuf, CliError> {
    let path = flag
        .or(cfg.archive_path.as_ref())
        .cloned()
        .ok_or_else(|| CliError::Validation {
            field: "archive_path".into(),
            reason: "required (--archive-path or archive_path in the config file)".into(),
        })?;
    if !path.is_dir() {
        return Err(CliError::Validation {
            field: "archive_path".into(),
            reason: format!("{} is not a directory", path.display()),
        });
    }
    Ok(path)
}

pub fn run_options(cfg: &Config) -> RunOptions {
    reprovision_config::run_options(&cfg.defaults)
}

/// Resolve an API key and build the portal client.
///
/// A key connected to the CI build wins over the configured one. When a
/// CI connection is set up, a configured key that cannot be resolved is
/// only a warning, since the brokered key may still be available.
pub async fn connect(cfg: &Config) -> Result<AppStoreConnect, CliError> {
    let transport = reprovision_config::transport(cfg);
    let ci = reprovision_config::ci_connection(&cfg.ci);

    let configured = match reprovision_config::configured_api_key(&cfg.api) {
        Ok(key) => key,
        Err(e) if ci.is_some() => {
            tracing::warn!("configured API key unavailable: {e}");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let key = reprovision_core::resolve_api_key(ci.as_ref(), configured, &transport).await?;
    tracing::debug!(key_id = %key.key_id, "connecting to App Store Connect");

    let mut client =
        AppStoreConnectClient::from_api_key(&key, &transport).map_err(reprovision_core::CoreError::from)?;
    if let Some(ref base_url) = cfg.api.base_url {
        client = client
            .with_base_url(base_url)
            .map_err(|e| CliError::Validation {
                field: "api.base_url".into(),
                reason: e.to_string(),
            })?;
    }
    Ok(AppStoreConnect::new(client))
}
