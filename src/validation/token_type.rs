//! RFC 8693 token type identifiers.

use serde::{Deserialize, Serialize};

/// Token type URNs (RFC 8693 section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// OAuth 2.0 access token.
    AccessToken,
    /// OAuth 2.0 refresh token.
    RefreshToken,
    /// OpenID Connect ID token.
    IdToken,
    /// Generic JWT.
    Jwt,
    /// SAML 1.1 assertion.
    Saml1,
    /// SAML 2.0 assertion.
    Saml2,
}

impl TokenType {
    /// All built-in token types.
    pub const ALL: [TokenType; 6] = [
        TokenType::Jwt,
        TokenType::IdToken,
        TokenType::AccessToken,
        TokenType::RefreshToken,
        TokenType::Saml1,
        TokenType::Saml2,
    ];

    /// Get the URN for this token type.
    pub fn as_urn(&self) -> &'static str {
        match self {
            TokenType::AccessToken => "urn:ietf:params:oauth:token-type:access_token",
            TokenType::RefreshToken => "urn:ietf:params:oauth:token-type:refresh_token",
            TokenType::IdToken => "urn:ietf:params:oauth:token-type:id_token",
            TokenType::Jwt => "urn:ietf:params:oauth:token-type:jwt",
            TokenType::Saml1 => "urn:ietf:params:oauth:token-type:saml1",
            TokenType::Saml2 => "urn:ietf:params:oauth:token-type:saml2",
        }
    }

    /// Parse from URN string.
    pub fn from_urn(urn: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_urn() == urn)
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_urn())
    }
}
