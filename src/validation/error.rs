//! Validation errors.
//!
//! Every failure surfaces to the token endpoint as `invalid_grant`; the
//! variants keep the underlying cause apart for logging and tests.

use thiserror::Error;

/// Error returned by subject token validators.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Malformed compact JWT, XML or claim structure.
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// Token envelope is neither standard nor URL-safe Base64.
    #[error("token is not valid Base64")]
    InvalidEncoding,

    /// Issuer missing or not in the trusted issuer list.
    #[error("untrusted issuer: {}", .issuer.as_deref().unwrap_or("<none>"))]
    UntrustedIssuer { issuer: Option<String> },

    #[error("token has expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// A required element (SAML Issuer or Subject) is absent or empty.
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("delegation chain depth {depth} exceeds limit (max delegation chain depth {max})")]
    DelegationDepthExceeded { depth: usize, max: u32 },
}

impl ValidationError {
    /// OAuth error code for the token endpoint response.
    pub fn error_code(&self) -> &'static str {
        "invalid_grant"
    }
}

/// Failure while resolving a verification key or checking a signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("no key found")]
    NoKeyFound,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("failed to fetch JWKS: {0}")]
    Jwks(String),

    #[error("signature does not match")]
    Mismatch,

    #[error("{0}")]
    Verification(String),
}
