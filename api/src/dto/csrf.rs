//! Token issuance response DTO.

use serde::{Deserialize, Serialize};

/// Body returned by `GET /api/v1/csrf-token`.
///
/// Field names are camelCase on the wire; `expiresIn` is milliseconds so the
/// client can schedule a refresh without clock math in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    /// The issued token value (64 hex characters)
    pub csrf_token: String,
    /// Token lifetime in milliseconds
    pub expires_in: u64,
}
