// Client for a CI-brokered Apple Developer Portal connection.
//
// The CI platform exposes the API key attached to the build at
// `{build_url}/apple_developer_portal_data.json`, authorized by the
// per-build `BUILD_API_TOKEN` header.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::auth::ApiKey;
use crate::error::Error;
use crate::transport::TransportConfig;

#[derive(Deserialize)]
struct ConnectionResponse {
    #[serde(default)]
    api_key_connection: Option<ApiKeyConnection>,
}

#[derive(Deserialize)]
struct ApiKeyConnection {
    key_id: String,
    issuer_id: String,
    private_key: String,
}

/// What the CI platform knows about the build's portal connection.
#[derive(Debug, Clone, Default)]
pub struct PortalConnection {
    /// `None` when no API key connection is attached to the build.
    pub api_key: Option<ApiKey>,
}

/// Fetches the portal connection attached to the current CI build.
pub struct ConnectionClient {
    http: reqwest::Client,
    build_url: Url,
}

impl ConnectionClient {
    /// Build a client that sends `BUILD_API_TOKEN` on every request.
    pub fn new(
        build_url: &str,
        build_api_token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(build_api_token.expose_secret()).map_err(|e| {
            Error::Authentication {
                message: format!("invalid build API token header value: {e}"),
            }
        })?;
        token.set_sensitive(true);
        headers.insert("build_api_token", token);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(build_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(build_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut build_url = Url::parse(build_url)?;
        let path = build_url.path().trim_end_matches('/').to_owned();
        build_url.set_path(&format!("{path}/"));
        Ok(Self { http, build_url })
    }

    /// `GET {build_url}/apple_developer_portal_data.json`
    pub async fn fetch_connection(&self) -> Result<PortalConnection, Error> {
        let url = self.build_url.join("apple_developer_portal_data.json")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "build API token rejected (HTTP 401)".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                errors: vec![crate::error::ApiErrorMessage {
                    code: None,
                    title: status.to_string(),
                    detail: body.chars().take(200).collect(),
                }],
            });
        }

        let parsed: ConnectionResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;

        Ok(PortalConnection {
            api_key: parsed.api_key_connection.map(|c| ApiKey {
                key_id: c.key_id,
                issuer_id: c.issuer_id,
                private_key: SecretString::from(c.private_key),
            }),
        })
    }
}
