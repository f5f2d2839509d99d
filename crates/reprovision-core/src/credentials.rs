// ── API credential resolution ──
//
// A key attached to the CI build wins over a configured one. The CI
// lookup never fails the run: a rejected token (public PR builds), a
// network error or missing CI settings all yield `NotAvailable`.

use secrecy::SecretString;
use tracing::{info, warn};

use reprovision_api::{ApiKey, ConnectionClient, TransportConfig};

use crate::error::CoreError;

/// Where to ask for a CI-brokered developer portal connection.
#[derive(Debug, Clone)]
pub struct CiConnection {
    pub build_url: String,
    pub build_api_token: SecretString,
}

#[derive(Debug, Clone)]
pub enum BrokeredKey {
    Available(ApiKey),
    NotAvailable,
}

/// Ask the CI platform for the API key attached to this build.
pub async fn fetch_brokered_key(
    ci: Option<&CiConnection>,
    transport: &TransportConfig,
) -> BrokeredKey {
    let Some(ci) = ci else {
        warn!("build URL or build API token not set, skipping CI connection lookup");
        return BrokeredKey::NotAvailable;
    };

    let client = match ConnectionClient::new(&ci.build_url, &ci.build_api_token, transport) {
        Ok(client) => client,
        Err(e) => {
            warn!("cannot query the CI connection: {e}");
            return BrokeredKey::NotAvailable;
        }
    };

    match client.fetch_connection().await {
        Ok(connection) => match connection.api_key {
            Some(key) => {
                info!(key_id = %key.key_id, "using the API key connected to this build");
                BrokeredKey::Available(key)
            }
            None => {
                warn!("no developer portal API key connection is attached to this build");
                BrokeredKey::NotAvailable
            }
        },
        Err(reprovision_api::Error::Authentication { .. }) => {
            warn!("the CI platform rejected the build API token; connections are unavailable in this build");
            BrokeredKey::NotAvailable
        }
        Err(e) => {
            warn!("failed to fetch the CI connection: {e}");
            BrokeredKey::NotAvailable
        }
    }
}

/// Brokered key if there is one, otherwise `configured`.
///
/// Fails with [`CoreError::ValidationFailed`] when neither exists, before
/// any portal call is made.
pub async fn resolve_api_key(
    ci: Option<&CiConnection>,
    configured: Option<ApiKey>,
    transport: &TransportConfig,
) -> Result<ApiKey, CoreError> {
    match fetch_brokered_key(ci, transport).await {
        BrokeredKey::Available(key) => Ok(key),
        BrokeredKey::NotAvailable => configured.ok_or_else(|| CoreError::ValidationFailed {
            message: "no App Store Connect API key: connect one to the CI build or configure \
                      key ID, issuer ID and private key"
                .into(),
        }),
    }
}
