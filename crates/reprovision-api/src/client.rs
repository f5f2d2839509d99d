// Hand-crafted async HTTP client for the App Store Connect API.
//
// Base path: https://api.appstoreconnect.apple.com/v1/
// Auth: `Authorization: Bearer <ES256 JWT>`, re-signed by `TokenSigner`.

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{ApiKey, TokenSigner};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    BundleIdResource, CertificateResource, DeviceCreateRequest, DeviceResource, Document,
    ErrorDocument, PagedDocument, ProfileCreateRequest, ProfileResource,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the App Store Connect provisioning endpoints.
///
/// List endpoints return one [`PagedDocument`] at a time; follow
/// `links.next` with [`next_page`](Self::next_page). Relationship links
/// (`relationships.*.links.related`) are absolute URLs and are fetched as-is.
pub struct AppStoreConnectClient {
    http: reqwest::Client,
    base_url: Url,
    signer: Option<TokenSigner>,
}

impl AppStoreConnectClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key against the production API root.
    pub fn from_api_key(key: &ApiKey, transport: &TransportConfig) -> Result<Self, Error> {
        let signer = TokenSigner::new(key)?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(DEFAULT_BASE_URL)?,
            signer: Some(signer),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            signer: None,
        })
    }

    /// Point the client at a different API root (staging, mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        self.base_url = Self::normalize_base_url(base_url)?;
        Ok(self)
    }

    /// Ensure the base URL ends with `/` so `join("v1/...")` appends.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/devices"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Resolve a link returned by the API. Absolute links are used
    /// unchanged; relative ones are joined onto the base URL.
    fn link(&self, link: &str) -> Result<Url, Error> {
        match Url::parse(link) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.base_url.join(link.trim_start_matches('/'))?)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Auth ─────────────────────────────────────────────────────────

    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        match &self.signer {
            Some(signer) => {
                let token = signer.bearer_token()?;
                Ok(builder.header(AUTHORIZATION, format!("Bearer {token}")))
            }
            None => Ok(builder),
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url))?.send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self
            .authorize(self.http.get(url).query(params))?
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body))?.send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url))?.send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let errors = match serde_json::from_str::<ErrorDocument>(&raw) {
            Ok(doc) if !doc.errors.is_empty() => doc.errors,
            _ => vec![crate::error::ApiErrorMessage {
                code: None,
                title: status.to_string(),
                detail: raw.chars().take(200).collect(),
            }],
        };

        if status == reqwest::StatusCode::UNAUTHORIZED {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Error::Authentication { message };
        }

        Error::Api {
            status: status.as_u16(),
            errors,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Paging ───────────────────────────────────────────────────────

    /// Fetch the page a previous response pointed at via `links.next`.
    pub async fn next_page<T: DeserializeOwned>(&self, next: &str) -> Result<PagedDocument<T>, Error> {
        self.get(self.link(next)?).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// `GET /v1/devices?filter[platform]=..&filter[udid]=..&limit=..`
    pub async fn list_devices(
        &self,
        platform: &str,
        udid: Option<&str>,
        limit: u32,
    ) -> Result<PagedDocument<DeviceResource>, Error> {
        let mut params = vec![
            ("filter[platform]", platform.to_owned()),
            ("limit", limit.to_string()),
        ];
        if let Some(udid) = udid {
            params.push(("filter[udid]", udid.to_owned()));
        }
        self.get_with_params(self.url("v1/devices")?, &params).await
    }

    /// `POST /v1/devices`
    pub async fn create_device(
        &self,
        request: &DeviceCreateRequest,
    ) -> Result<Document<DeviceResource>, Error> {
        self.post(self.url("v1/devices")?, request).await
    }

    // ── Certificates ─────────────────────────────────────────────────

    /// Fetch the first page of a `certificates` relationship link.
    pub async fn list_related_certificates(
        &self,
        related: &str,
        limit: u32,
    ) -> Result<PagedDocument<CertificateResource>, Error> {
        self.get_with_params(self.link(related)?, &[("limit", limit.to_string())])
            .await
    }

    // ── Bundle IDs ───────────────────────────────────────────────────

    /// Fetch the bundle ID a profile's `bundleId` relationship points at.
    pub async fn get_related_bundle_id(
        &self,
        related: &str,
    ) -> Result<Document<BundleIdResource>, Error> {
        self.get(self.link(related)?).await
    }

    /// `GET /v1/bundleIds?filter[identifier]=..`
    ///
    /// The filter is a prefix match on the authority side; callers must
    /// compare identifiers exactly.
    pub async fn list_bundle_ids(
        &self,
        identifier: &str,
        limit: u32,
    ) -> Result<PagedDocument<BundleIdResource>, Error> {
        self.get_with_params(
            self.url("v1/bundleIds")?,
            &[
                ("filter[identifier]", identifier.to_owned()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// `GET /v1/profiles?filter[name]=..&limit=..`
    ///
    /// The name filter may return partial matches.
    pub async fn list_profiles(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<PagedDocument<ProfileResource>, Error> {
        self.get_with_params(
            self.url("v1/profiles")?,
            &[("filter[name]", name.to_owned()), ("limit", limit.to_string())],
        )
        .await
    }

    /// `GET /v1/profiles/{id}`
    pub async fn get_profile(&self, id: &str) -> Result<Document<ProfileResource>, Error> {
        self.get(self.url(&format!("v1/profiles/{id}"))?).await
    }

    /// `POST /v1/profiles`
    pub async fn create_profile(
        &self,
        request: &ProfileCreateRequest,
    ) -> Result<Document<ProfileResource>, Error> {
        self.post(self.url("v1/profiles")?, request).await
    }

    /// `DELETE /v1/profiles/{id}`
    pub async fn delete_profile(&self, id: &str) -> Result<(), Error> {
        self.delete(self.url(&format!("v1/profiles/{id}"))?).await
    }
}
