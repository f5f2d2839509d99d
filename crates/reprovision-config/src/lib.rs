//! Configuration for reprovision.
//!
//! A TOML file at the platform config path, overlaid by `REPROVISION_*`
//! environment variables (`REPROVISION_API__KEY_ID` → `api.key_id`), and
//! the private key chain (env var → system keyring → `.p8` file). The
//! CLI layers its own flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reprovision_api::{ApiKey, TlsMode, TransportConfig};
use reprovision_core::{CiConnection, Device, PlatformKind, RunOptions};

/// Keyring service name for stored private keys.
pub const KEYRING_SERVICE: &str = "reprovision";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no private key found for API key '{key_id}'")]
    NoCredentials { key_id: String },

    #[error("failed to read private key {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// App Store Connect API key settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// CI-brokered developer portal connection.
    #[serde(default)]
    pub ci: CiSettings,

    /// The test device to register.
    #[serde(default)]
    pub device: DeviceSettings,

    /// Build archive (`.xcarchive`) to scan for embedded profiles.
    pub archive_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Page size for device listings.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page size for certificate listings.
    #[serde(default = "default_certificate_page_size")]
    pub certificate_page_size: u32,

    /// Also filter device listings by UDID on the portal side.
    #[serde(default)]
    pub udid_filter: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            page_size: default_page_size(),
            certificate_page_size: default_certificate_page_size(),
            udid_filter: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    200
}
fn default_certificate_page_size() -> u32 {
    20
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    pub key_id: Option<String>,
    pub issuer_id: Option<String>,

    /// Path to the `.p8` private key file.
    pub private_key_path: Option<PathBuf>,

    /// Environment variable holding the PEM private key.
    pub private_key_env: Option<String>,

    /// Override the API base URL.
    pub base_url: Option<String>,

    /// Extra CA certificate to trust (corporate proxies).
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CiSettings {
    pub build_url: Option<String>,
    /// Per-build token (plaintext; prefer the environment).
    pub build_api_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSettings {
    pub name: Option<String>,
    pub udid: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            name: None,
            udid: None,
            platform: default_platform(),
        }
    }
}

fn default_platform() -> String {
    "ios".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "reprovision", "reprovision").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("reprovision");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load `path` overlaid by the environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("REPROVISION_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Private key resolution ──────────────────────────────────────────

fn keyring_entry(key_id: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{key_id}/private-key"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

fn keyring_lookup(key_id: &str) -> Option<String> {
    keyring_entry(key_id).ok()?.get_password().ok()
}

/// Store a PEM private key in the system keyring.
pub fn store_private_key(key_id: &str, pem: &str) -> Result<(), ConfigError> {
    keyring_entry(key_id)?
        .set_password(pem)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the private key: named env var → keyring → key file.
pub fn resolve_private_key(api: &ApiSettings, key_id: &str) -> Result<SecretString, ConfigError> {
    resolve_private_key_with(api, key_id, keyring_lookup)
}

fn resolve_private_key_with(
    api: &ApiSettings,
    key_id: &str,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Named environment variable
    if let Some(ref env_name) = api.private_key_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring(key_id) {
        return Ok(SecretString::from(secret));
    }

    // 3. Key file
    if let Some(ref path) = api.private_key_path {
        let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
            path: path.clone(),
            source,
        })?;
        return Ok(SecretString::from(pem));
    }

    Err(ConfigError::NoCredentials {
        key_id: key_id.into(),
    })
}

/// The configured API key, if key ID and issuer ID are both set.
///
/// Returns `Ok(None)` when either is missing, so a CI-brokered key can
/// still be used. A set key ID with no findable private key is an error.
pub fn configured_api_key(api: &ApiSettings) -> Result<Option<ApiKey>, ConfigError> {
    configured_api_key_with(api, keyring_lookup)
}

fn configured_api_key_with(
    api: &ApiSettings,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<Option<ApiKey>, ConfigError> {
    let (Some(key_id), Some(issuer_id)) = (non_empty(api.key_id.as_ref()), non_empty(api.issuer_id.as_ref()))
    else {
        return Ok(None);
    };
    let private_key = resolve_private_key_with(api, key_id, keyring)?;
    Ok(Some(ApiKey {
        key_id: key_id.to_owned(),
        issuer_id: issuer_id.to_owned(),
        private_key,
    }))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

// ── Translation to core types ───────────────────────────────────────

/// The configured test device. Name and UDID are required and the
/// platform must be recognized.
pub fn device(settings: &DeviceSettings) -> Result<Device, ConfigError> {
    let missing = |field: &str| ConfigError::Validation {
        field: format!("device.{field}"),
        reason: "required".into(),
    };
    let name = non_empty(settings.name.as_ref()).ok_or_else(|| missing("name"))?;
    let udid = non_empty(settings.udid.as_ref()).ok_or_else(|| missing("udid"))?;

    let device = Device::new(name, udid, &settings.platform);
    if device.platform == PlatformKind::Unknown {
        return Err(ConfigError::Validation {
            field: "device.platform".into(),
            reason: format!("expected 'ios', 'macos' or 'universal', got '{}'", settings.platform),
        });
    }
    Ok(device)
}

/// CI connection settings, when both URL and token are set.
pub fn ci_connection(ci: &CiSettings) -> Option<CiConnection> {
    let build_url = non_empty(ci.build_url.as_ref())?;
    let token = non_empty(ci.build_api_token.as_ref())?;
    Some(CiConnection {
        build_url: build_url.to_owned(),
        build_api_token: SecretString::from(token.to_owned()),
    })
}

pub fn transport(cfg: &Config) -> TransportConfig {
    TransportConfig {
        tls: cfg
            .api
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa),
        timeout: Duration::from_secs(cfg.defaults.timeout),
    }
}

pub fn run_options(defaults: &Defaults) -> RunOptions {
    RunOptions {
        device_page_limit: defaults.page_size,
        certificate_page_limit: defaults.certificate_page_size,
        udid_filter: defaults.udid_filter,
    }
}
