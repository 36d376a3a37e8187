//! Transport seam between the interceptor and the wire
//!
//! The interceptor's caching, dedup, and retry logic is written against
//! [`CsrfTransport`] so it can be exercised without a network; production
//! code uses the reqwest-backed [`HttpTransport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use am_shared::protocol::{CSRF_TOKEN_PATH, SESSION_COOKIE};

use crate::error::ClientError;

/// Successful issuance response
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The token value to attach as the CSRF header
    pub value: String,
    /// Lifetime reported by the authority, in milliseconds
    pub expires_in_ms: u64,
}

/// An outgoing application request, ready for the wire
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    /// Extra headers the interceptor decided to attach
    pub headers: Vec<(String, String)>,
    pub json_body: Option<serde_json::Value>,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            json_body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.json_body = Some(body);
        self
    }
}

/// Response handed back to the interceptor
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Wire operations the interceptor depends on
#[async_trait]
pub trait CsrfTransport: Send + Sync {
    /// Request a fresh token from the issuance endpoint
    async fn fetch_token(&self) -> Result<IssuedToken, ClientError>;

    /// Send an application request
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClientError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueResponse {
    csrf_token: String,
    expires_in: Option<u64>,
}

/// Default token lifetime assumed when the authority omits `expiresIn`
const DEFAULT_EXPIRES_IN_MS: u64 = 3_600_000;

/// reqwest-backed transport
///
/// The session cookie lives in the client's cookie jar, scoped to the
/// configured origin, so reqwest itself guarantees it is never sent
/// cross-origin.
pub struct HttpTransport {
    http: reqwest::Client,
    origin: Url,
}

impl HttpTransport {
    /// Build a transport for `origin` with the session cookie seeded into the
    /// jar
    pub fn new(origin: Url, session_id: &str) -> Result<Self, ClientError> {
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(
            &format!("{SESSION_COOKIE}={session_id}; SameSite=Strict"),
            &origin,
        );
        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self { http, origin })
    }

    fn issuance_url(&self) -> Result<Url, ClientError> {
        self.origin
            .join(CSRF_TOKEN_PATH)
            .map_err(|e| ClientError::InvalidResponse {
                message: format!("bad issuance URL: {e}"),
            })
    }
}

#[async_trait]
impl CsrfTransport for HttpTransport {
    async fn fetch_token(&self) -> Result<IssuedToken, ClientError> {
        let response = self.http.get(self.issuance_url()?).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ClientError::NoSession),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(ClientError::RateLimited { retry_after })
            }
            status if status.is_success() => {
                let issued: IssueResponse =
                    response.json().await.map_err(|e| ClientError::InvalidResponse {
                        message: e.to_string(),
                    })?;
                debug!("fetched fresh CSRF token");
                Ok(IssuedToken {
                    value: issued.csrf_token,
                    expires_in_ms: issued.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_MS),
                })
            }
            status => Err(ClientError::InvalidResponse {
                message: format!("unexpected issuance status {status}"),
            }),
        }
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        let mut builder = self.http.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.json_body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
