use std::env;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::identity::SessionIdentity;
use crate::observability::{CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{CaseRecord, HealthStatus, OutgoingMessage, ServerReply};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const HONEYPOT_PATH: &str = "api/honeypot";
const EVIDENCE_PATH: &str = "api/download/evidence";
const REPORT_PATH: &str = "api/pdf/";
const HEALTH_PATH: &str = "api/health";
const CASES_PATH: &str = "api/admin/scams";

/// Environment variable consulted when no base URL is given.
pub const BASE_URL_ENV: &str = "HONEYPOT_URL";

/// Environment variable consulted when no API key is given.
pub const API_KEY_ENV: &str = "HONEYPOT_API_KEY";

/// The single round trip a chat session depends on.
///
/// [`HoneypotClient`] is the production implementation; tests substitute
/// scripted transports.
#[async_trait]
pub trait HoneypotTransport: Send + Sync {
    /// Submits one message and returns the service's raw reply.
    ///
    /// Transport failures and non-success statuses are both errors; the
    /// caller decides how to surface them.
    async fn analyze(&self, message: &OutgoingMessage) -> Result<ServerReply>;
}

/// Client for the honeypot analysis service.
#[derive(Debug, Clone)]
pub struct HoneypotClient {
    client: ReqwestClient,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HoneypotClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the HONEYPOT_URL
    /// environment variable, falling back to a local development server.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;
        let api_key = api_key.or_else(|| env::var(API_KEY_ENV).ok());

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_request_error(&self, e: reqwest::Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Convert a non-success response into an API error.
    ///
    /// The service reports errors as `{"error": ...}` or `{"message": ...}`;
    /// anything else is passed through as raw text.
    async fn process_error_response(response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            message: Option<String>,
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::api(
                    status_code,
                    format!("Failed to read error response: {}", e),
                );
            }
        };

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .unwrap_or(body);
        Error::api(status_code, message)
    }

    async fn get(&self, path: &str, headers: HeaderMap) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let response = self
            .client
            .get(self.endpoint(path)?)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, headers: HeaderMap) -> Result<T> {
        let response = self.get(path, headers).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;
        serde_json::from_slice(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn get_bytes(&self, path: &str) -> Result<Bytes> {
        let mut headers = self.default_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        let response = self.get(path, headers).await?;
        response.bytes().await.map_err(|e| self.map_request_error(e))
    }

    /// Download the service's evidence export (CSV).
    pub async fn download_evidence(&self) -> Result<Bytes> {
        self.get_bytes(EVIDENCE_PATH).await
    }

    /// Download the PDF case report for one identity.
    pub async fn download_report(&self, identity: &SessionIdentity) -> Result<Bytes> {
        self.get_bytes(&format!("{REPORT_PATH}{identity}")).await
    }

    /// Check service health. Requires an API key.
    pub async fn health(&self) -> Result<HealthStatus> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::validation(
                format!("API key not provided and {API_KEY_ENV} environment variable not set"),
                Some("api_key".to_string()),
            )
        })?;
        let mut headers = self.default_headers();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|_| {
                Error::validation(
                    "API key contains invalid header characters",
                    Some("api_key".to_string()),
                )
            })?,
        );
        self.get_json(HEALTH_PATH, headers).await
    }

    /// List every recorded scam message, newest first.
    pub async fn cases(&self) -> Result<Vec<CaseRecord>> {
        self.get_json(CASES_PATH, self.default_headers()).await
    }
}

#[async_trait]
impl HoneypotTransport for HoneypotClient {
    async fn analyze(&self, message: &OutgoingMessage) -> Result<ServerReply> {
        CLIENT_REQUESTS.click();
        let mut headers = self.default_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let response = self
            .client
            .post(self.endpoint(HONEYPOT_PATH)?)
            .headers(headers)
            .json(message)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;
        // Any JSON value is accepted; only an object contributes fields.
        let value = serde_json::from_slice::<serde_json::Value>(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(ServerReply::from_value(value))
    }
}

/// Parses a base URL, making sure relative joins land under its path.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
