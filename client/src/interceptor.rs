//! The request interceptor
//!
//! [`CsrfClient`] is the one HTTP client application code uses for Amora API
//! calls. It attaches the CSRF header to same-origin state-changing requests,
//! passes everything else through untouched, and recovers from a token
//! rejection with exactly one retry.

use reqwest::{Method, Url};
use tracing::{debug, info};

use am_shared::protocol::{is_state_changing, CSRF_HEADER, LEGACY_SESSION_PARAM};

use crate::cache::{BackoffConfig, TokenCache};
use crate::error::ClientError;
use crate::transport::{CsrfTransport, HttpTransport, TransportRequest, TransportResponse};

/// Statuses the authority uses for "token rejected, refresh and retry once"
const REJECTED_STATUSES: [u16; 2] = [403, 419];

/// HTTP client wrapper enforcing the CSRF protocol
pub struct CsrfClient<T: CsrfTransport> {
    transport: T,
    origin: Url,
    cache: TokenCache,
}

/// The production client over reqwest
pub type HttpCsrfClient = CsrfClient<HttpTransport>;

impl HttpCsrfClient {
    /// Build a client for `origin` authenticated by `session_id`
    pub fn new(origin: Url, session_id: &str) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(origin.clone(), session_id)?;
        Ok(Self::with_transport(transport, origin, BackoffConfig::default()))
    }
}

impl<T: CsrfTransport> CsrfClient<T> {
    /// Build a client over an arbitrary transport (used by tests)
    pub fn with_transport(transport: T, origin: Url, backoff: BackoffConfig) -> Self {
        Self {
            transport,
            origin,
            cache: TokenCache::new(backoff),
        }
    }

    /// Send a request, attaching the CSRF token when the protocol requires it
    ///
    /// Cross-origin requests and safe methods go out untouched; attaching the
    /// token to a foreign origin would leak it. A `403`/`419` response drops
    /// the cached token, fetches a fresh one, and retries the original
    /// request exactly once; a second rejection is surfaced as
    /// [`ClientError::Rejected`].
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        json_body: Option<serde_json::Value>,
    ) -> Result<TransportResponse, ClientError> {
        let checked = is_state_changing(method.as_str()) && is_same_origin(&self.origin, &url);
        if !checked {
            let mut request = TransportRequest::new(method, url);
            if let Some(body) = json_body {
                request = request.with_json(body);
            }
            return self.transport.execute(request).await;
        }

        let token = self.cache.token(&self.transport).await?;
        let response = self
            .execute_with_token(&method, &url, &json_body, &token)
            .await?;

        match response.status {
            401 => Err(ClientError::SessionExpired),
            status if REJECTED_STATUSES.contains(&status) => {
                debug!(status, "token rejected, refreshing and retrying once");
                self.cache.invalidate(&token).await;
                let fresh = self.cache.token(&self.transport).await?;
                let retry = self
                    .execute_with_token(&method, &url, &json_body, &fresh)
                    .await?;
                match retry.status {
                    401 => Err(ClientError::SessionExpired),
                    status if REJECTED_STATUSES.contains(&status) => Err(ClientError::Rejected),
                    _ => Ok(retry),
                }
            }
            _ => Ok(response),
        }
    }

    async fn execute_with_token(
        &self,
        method: &Method,
        url: &Url,
        json_body: &Option<serde_json::Value>,
        token: &str,
    ) -> Result<TransportResponse, ClientError> {
        let mut request =
            TransportRequest::new(method.clone(), url.clone()).with_header(CSRF_HEADER, token);
        if let Some(body) = json_body {
            request = request.with_json(body.clone());
        }
        self.transport.execute(request).await
    }

    /// GET passthrough (read-only, never carries a token)
    pub async fn get(&self, url: Url) -> Result<TransportResponse, ClientError> {
        self.send(Method::GET, url, None).await
    }

    /// Same-origin POST with a JSON body
    pub async fn post(
        &self,
        url: Url,
        body: serde_json::Value,
    ) -> Result<TransportResponse, ClientError> {
        self.send(Method::POST, url, Some(body)).await
    }

    /// DELETE request
    pub async fn delete(&self, url: Url) -> Result<TransportResponse, ClientError> {
        self.send(Method::DELETE, url, None).await
    }

    /// The token cache (exposed for introspection in tests)
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    #[cfg(test)]
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }
}

/// True when both URLs share scheme, host, and effective port
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// One-shot legacy bootstrap: lift a session id out of a URL query parameter
///
/// Returns the session id and the URL with the parameter stripped, ready for
/// history replacement, so the id never stays visible in an address bar or
/// leaks through a referrer header. Returns `None` when the URL carries no
/// legacy parameter.
pub fn bootstrap_session_from_url(url: &Url) -> Option<(String, Url)> {
    let session_id = url
        .query_pairs()
        .find(|(name, _)| name == LEGACY_SESSION_PARAM)
        .map(|(_, value)| value.into_owned())?;
    if session_id.is_empty() {
        return None;
    }

    let mut cleaned = url.clone();
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != LEGACY_SESSION_PARAM)
        .map(|(n, v)| (n.into_owned(), v.into_owned()))
        .collect();
    if remaining.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned
            .query_pairs_mut()
            .clear()
            .extend_pairs(remaining)
            .finish();
    }

    info!("migrated legacy session parameter into cookie scope");
    Some((session_id, cleaned))
}
