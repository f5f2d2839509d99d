use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Error;

/// Audience claim required by App Store Connect.
const AUDIENCE: &str = "appstoreconnect-v1";

/// App Store Connect rejects tokens living longer than 20 minutes.
const TOKEN_LIFETIME: Duration = Duration::from_secs(19 * 60);

/// Re-sign this long before the cached token expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// An App Store Connect API key: the triple needed to sign bearer tokens.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub key_id: String,
    pub issuer_id: String,
    /// PEM-encoded PKCS#8 P-256 private key (the `.p8` file contents).
    pub private_key: SecretString,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    iat: u64,
    exp: u64,
    aud: String,
}

struct CachedToken {
    token: String,
    expires_at: u64,
}

/// Signs and caches ES256 bearer tokens for an [`ApiKey`].
pub struct TokenSigner {
    key_id: String,
    issuer_id: String,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Parse the private key up front so a malformed `.p8` fails before
    /// any request is made.
    pub fn new(key: &ApiKey) -> Result<Self, Error> {
        let encoding_key = EncodingKey::from_ec_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| Error::Jwt(format!("invalid EC private key: {e}")))?;

        Ok(Self {
            key_id: key.key_id.clone(),
            issuer_id: key.issuer_id.clone(),
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, re-signing when the cached one is
    /// within [`REFRESH_MARGIN`] of expiry.
    pub fn bearer_token(&self) -> Result<String, Error> {
        let now = unix_now()?;
        let mut guard = self.cached.lock().expect("token lock poisoned");

        if let Some(cached) = guard.as_ref() {
            if now + REFRESH_MARGIN.as_secs() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.sign(now)?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    #[instrument(skip(self), fields(key_id = %self.key_id))]
    fn sign(&self, now: u64) -> Result<CachedToken, Error> {
        let expires_at = now + TOKEN_LIFETIME.as_secs();
        let claims = Claims {
            iss: self.issuer_id.clone(),
            iat: now,
            exp: expires_at,
            aud: AUDIENCE.into(),
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        header.typ = Some("JWT".into());

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| Error::Jwt(format!("failed to encode JWT: {e}")))?;

        debug!(exp = expires_at, "signed App Store Connect token");
        Ok(CachedToken { token, expires_at })
    }
}

fn unix_now() -> Result<u64, Error> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Jwt(format!("system time error: {e}")))
}
