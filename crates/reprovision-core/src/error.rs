// ── Core error types ──
//
// Domain errors from reprovision-core. Consumers never inspect raw HTTP
// responses: the `From<reprovision_api::Error>` impl classifies transport
// failures once (409 → Conflict, 404 → NotFound) and everything
// downstream matches on these variants.

use std::fmt;

use thiserror::Error;

/// A step of the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ReconcileStage {
    Locate,
    ResolveBundleId,
    CollectCertificates,
    CollectDevices,
    Delete,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Locate => "locating the profile",
            Self::ResolveBundleId => "resolving the bundle ID",
            Self::CollectCertificates => "collecting certificates",
            Self::CollectDevices => "collecting devices",
            Self::Delete => "deleting the profile",
        })
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("API error (HTTP {status}): {}", .messages.join("; "))]
    Api { status: u16, messages: Vec<String> },

    /// The authority already holds a matching record (HTTP 409).
    #[error("Conflict: {}", .messages.join("; "))]
    Conflict { messages: Vec<String> },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Contextual wrappers ──────────────────────────────────────────
    #[error("Failed to register device {name} ({udid})")]
    Registration {
        name: String,
        udid: String,
        #[source]
        source: Box<CoreError>,
    },

    /// Failure before the profile was deleted: no remote state changed.
    #[error("Failed to reconcile profile {name} ({uuid}) while {stage}")]
    Reconcile {
        name: String,
        uuid: String,
        stage: ReconcileStage,
        #[source]
        source: Box<CoreError>,
    },

    /// The profile was deleted and recreating it failed. The named
    /// profile no longer exists until a later run succeeds.
    #[error(
        "Profile {name} ({uuid}, id {previous_id}) was DELETED but could not be recreated; \
         it no longer exists on the developer portal"
    )]
    ProfileLost {
        name: String,
        uuid: String,
        previous_id: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Failed to install profile {name} ({uuid}): {reason}")]
    Install {
        name: String,
        uuid: String,
        reason: String,
    },

    #[error("Failed to inspect provisioning profile {path}: {reason}")]
    Inspection { path: String, reason: String },

    #[error("Pagination aborted: {reason}")]
    Pagination { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The innermost error, looking through contextual wrappers.
    pub fn root(&self) -> &Self {
        match self {
            Self::Registration { source, .. }
            | Self::Reconcile { source, .. }
            | Self::ProfileLost { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// `true` when remote state was destroyed and not restored.
    pub fn is_profile_lost(&self) -> bool {
        matches!(self, Self::ProfileLost { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<reprovision_api::Error> for CoreError {
    fn from(err: reprovision_api::Error) -> Self {
        use reprovision_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Jwt(message) => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::Transport {
                        message: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::Transport {
                message: format!("TLS error: {message}"),
            },
            ApiError::Api { status, errors } => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                match status {
                    409 => CoreError::Conflict { messages },
                    404 => CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: messages.join("; "),
                    },
                    _ => CoreError::Api { status, messages },
                }
            }
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
