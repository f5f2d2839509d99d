use thiserror::Error;

/// A single entry from the JSON:API `errors` array.
///
/// App Store Connect reports every failure as a list of these; the
/// `title`/`detail` pair is what a human needs to see.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ApiErrorMessage {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl std::fmt::Display for ApiErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.title.is_empty(), self.detail.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.title, self.detail),
            (false, true) => f.write_str(&self.title),
            (true, _) => f.write_str(&self.detail),
        }
    }
}

/// Top-level error type for the `reprovision-api` crate.
///
/// Status codes are classified once, in the client, and carried as data.
/// `reprovision-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API key was rejected or the bearer token could not be built.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// JWT signing failed (malformed private key, clock error).
    #[error("JWT error: {0}")]
    Jwt(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Structured JSON:API error response.
    #[error("API error (HTTP {status}){}", format_messages(.errors))]
    Api {
        status: u16,
        errors: Vec<ApiErrorMessage>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

fn format_messages(errors: &[ApiErrorMessage]) -> String {
    errors.iter().map(|e| format!("\n{e}")).collect()
}

impl Error {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the authority reported a duplicate (HTTP 409).
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth reporting as such.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The `(title, detail)` messages reported by the authority.
    pub fn messages(&self) -> &[ApiErrorMessage] {
        match self {
            Self::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}
