// Advisory API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection
// from the shared `Session`, and status-to-error mapping. Endpoint groups
// (farms, crops, weather, ...) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::ErrorBody;
use crate::session::Session;
use crate::transport::TransportConfig;

/// Async client for the advisory backend.
///
/// Every public method performs exactly one HTTP request and returns the
/// decoded payload. A 401 on any authenticated endpoint expires the
/// session before the error reaches the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` using the given transport settings.
    pub fn new(base_url: &str, session: Session, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http, session)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client, session: Session) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            session,
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"farms/3/crops"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Attach `Authorization: Bearer` when a token is held.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .authorize(self.http.get(url).query(params))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.authorize(self.http.put(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url} (multipart)");

        let resp = self
            .authorize(self.http.post(url).multipart(form))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Send a request without the session token and without expiring the
    /// session on 401. Used by the login exchange itself.
    pub(crate) async fn post_anonymous(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("POST {url} (anonymous)");
        Ok(self.http.post(url).json(body).send().await?)
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            trace!(status = status.as_u16(), len = body.len(), "response body received");
            decode(body)
        } else {
            Err(self.parse_error(status, resp, true).await)
        }
    }

    /// Like [`handle_response`](Self::handle_response), but a 401 is a
    /// credential rejection that leaves the session alone.
    pub(crate) async fn handle_anonymous_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            decode(resp.text().await?)
        } else {
            Err(self.parse_error(status, resp, false).await)
        }
    }

    async fn parse_error(
        &self,
        status: StatusCode,
        resp: reqwest::Response,
        authenticated: bool,
    ) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();
        let message = detail_message(status, raw);

        match status {
            StatusCode::UNAUTHORIZED if authenticated => {
                // One expiry per rejected response.
                self.session.expire();
                Error::Unauthorized { message }
            }
            StatusCode::UNAUTHORIZED => Error::LoginRejected { message },
            StatusCode::NOT_FOUND => Error::NotFound { path, message },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::Validation {
                status: status.as_u16(),
                message,
            },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Decode a JSON body, keeping a preview for diagnostics.
pub(crate) fn decode<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Extract the server's `detail`, falling back to the raw body or the
/// status reason.
pub(crate) fn detail_message(status: StatusCode, raw: String) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(&raw) {
        return err.detail.into_message();
    }
    if raw.is_empty() {
        status.to_string()
    } else {
        raw
    }
}
