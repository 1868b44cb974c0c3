//! RFC 8693 error responses.

use serde::Serialize;

use crate::validation::ValidationError;

/// Token exchange error response body.
#[derive(Debug, Serialize)]
pub struct TokenExchangeError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenExchangeError {
    fn new(error: &str, desc: &str) -> Self {
        Self {
            error: error.to_string(),
            error_description: Some(desc.to_string()),
        }
    }

    pub fn invalid_request(desc: &str) -> Self {
        Self::new("invalid_request", desc)
    }

    pub fn invalid_grant(desc: &str) -> Self {
        Self::new("invalid_grant", desc)
    }

    pub fn unsupported_token_type(desc: &str) -> Self {
        Self::new("unsupported_token_type", desc)
    }

    /// Form-encoded representation (`error=..&error_description=..`).
    pub fn to_form(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_else(|_| format!("error={}", self.error))
    }
}

/// Every validation failure is an `invalid_grant`, described by the
/// validator's message.
impl From<ValidationError> for TokenExchangeError {
    fn from(e: ValidationError) -> Self {
        Self {
            error: e.error_code().to_string(),
            error_description: Some(e.to_string()),
        }
    }
}
