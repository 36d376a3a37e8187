//! Wire-level contract between the token authority and the request interceptor
//!
//! Both the server middleware and the client wrapper read these names, so a
//! rename here is a protocol change for every deployed client.

/// Request header carrying the CSRF token value.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Top-level JSON body field checked when the header is absent.
pub const CSRF_BODY_FIELD: &str = "csrfToken";

/// Session cookie name. The session id is read from this cookie only,
/// never from a URL query parameter.
pub const SESSION_COOKIE: &str = "amora_session";

/// Legacy query parameter consumed once by the session bootstrap shim.
pub const LEGACY_SESSION_PARAM: &str = "session";

/// Path of the token issuance endpoint.
pub const CSRF_TOKEN_PATH: &str = "/api/v1/csrf-token";

/// Path of the one-shot session bootstrap endpoint.
pub const SESSION_BOOTSTRAP_PATH: &str = "/api/v1/session/bootstrap";

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// HTTP methods that can mutate server state and therefore carry a token.
pub const STATE_CHANGING_METHODS: [&str; 4] = ["POST", "PUT", "PATCH", "DELETE"];

/// Returns true if the method belongs to the checked (state-changing) set.
pub fn is_state_changing(method: &str) -> bool {
    STATE_CHANGING_METHODS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_changing_methods_are_checked() {
        for m in ["POST", "put", "Patch", "DELETE"] {
            assert!(is_state_changing(m), "{m} should be checked");
        }
    }

    #[test]
    fn safe_methods_pass_through() {
        for m in ["GET", "HEAD", "OPTIONS", "TRACE"] {
            assert!(!is_state_changing(m), "{m} should not be checked");
        }
    }
}
