//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use reprovision_config::ConfigError;
use reprovision_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PROFILE_LOST: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach App Store Connect: {message}")]
    #[diagnostic(
        code(reprovision::connection_failed),
        help("Check network access to api.appstoreconnect.apple.com and any proxy CA (api.ca_cert).")
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(reprovision::timeout),
        help("Increase the timeout with --timeout or [defaults] timeout.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(reprovision::auth_failed),
        help(
            "Verify the key ID, issuer ID and private key.\n\
             The key needs the Admin or Developer role in App Store Connect."
        )
    )]
    AuthFailed { message: String },

    #[error("No private key found for API key '{key_id}'")]
    #[diagnostic(
        code(reprovision::no_credentials),
        help(
            "Store one with: reprovision config set-key --key-id {key_id}\n\
             Or set api.private_key_path / --private-key-path."
        )
    )]
    NoCredentials { key_id: String },

    // ── Portal state ─────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(reprovision::not_found),
        help("Names are matched exactly. Check the developer portal for the {resource_type}.")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(reprovision::conflict))]
    Conflict { message: String },

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(reprovision::api_error))]
    ApiError { status: u16, message: String },

    #[error(
        "Profile '{name}' ({uuid}) was deleted but could not be recreated: {reason}"
    )]
    #[diagnostic(
        code(reprovision::profile_lost),
        severity(Error),
        help(
            "The profile no longer exists on the developer portal (previous id {previous_id}).\n\
             Re-run `reprovision reconcile --profile \"{name}\"` or recreate it in the portal."
        )
    )]
    ProfileLost {
        name: String,
        uuid: String,
        previous_id: String,
        reason: String,
    },

    /// A failure with the device or profile it concerns.
    #[error("{context}")]
    #[diagnostic(code(reprovision::failed))]
    Context {
        context: String,
        #[source]
        #[diagnostic_source]
        source: Box<CliError>,
    },

    // ── Local files ──────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(reprovision::local),
        help("Profiles are read with `security cms` and PlistBuddy, which require macOS.")
    )]
    Local { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(reprovision::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(reprovision::config))]
    Config(ConfigError),

    #[error("{0}")]
    #[diagnostic(code(reprovision::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::ProfileLost { .. } => exit_code::PROFILE_LOST,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Context { source, .. } => source.exit_code(),
            _ => exit_code::GENERAL,
        }
    }
}

// Required by `#[diagnostic_source]` on `CliError::Context`.
impl std::borrow::Borrow<dyn Diagnostic> for Box<CliError> {
    fn borrow(&self) -> &(dyn Diagnostic + 'static) {
        self.as_ref()
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Transport { message } => CliError::ConnectionFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api { status, messages } => CliError::ApiError {
                status,
                message: messages.join("; "),
            },

            CoreError::Conflict { messages } => CliError::Conflict {
                message: messages.join("; "),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Registration { name, udid, source } => CliError::Context {
                context: format!("Failed to register device {name} ({udid})"),
                source: Box::new((*source).into()),
            },

            CoreError::Reconcile {
                name,
                uuid,
                stage,
                source,
            } => CliError::Context {
                context: format!(
                    "Failed to reconcile profile '{name}' ({uuid}) while {stage}; the profile was not changed"
                ),
                source: Box::new((*source).into()),
            },

            CoreError::ProfileLost {
                name,
                uuid,
                previous_id,
                source,
            } => CliError::ProfileLost {
                name,
                uuid,
                previous_id,
                reason: source.to_string(),
            },

            err @ (CoreError::Install { .. }
            | CoreError::Inspection { .. }
            | CoreError::Pagination { .. }) => CliError::Local {
                message: err.to_string(),
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { key_id } => CliError::NoCredentials { key_id },
            other => CliError::Config(other),
        }
    }
}
