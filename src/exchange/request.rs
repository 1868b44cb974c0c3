//! Token exchange request parsing.

use serde::Deserialize;

use super::error::TokenExchangeError;
use crate::validation::TokenType;

/// Token exchange grant type (RFC 8693).
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Token exchange request (form-urlencoded body).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeRequest {
    /// Must be "urn:ietf:params:oauth:grant-type:token-exchange".
    pub grant_type: String,
    /// The subject token to exchange.
    pub subject_token: String,
    /// Type of the subject token (URN).
    pub subject_token_type: String,
    /// Requested token type (optional, defaults to access_token).
    #[serde(default)]
    pub requested_token_type: Option<String>,
    /// Target audience for the new token.
    #[serde(default)]
    pub audience: Option<String>,
    /// Requested scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// Target resource.
    #[serde(default)]
    pub resource: Option<String>,
    /// Actor token (for delegation).
    #[serde(default)]
    pub actor_token: Option<String>,
    /// Actor token type.
    #[serde(default)]
    pub actor_token_type: Option<String>,
}

impl TokenExchangeRequest {
    /// Requested token type, defaulting to an access token.
    pub fn requested_type(&self) -> Result<TokenType, TokenExchangeError> {
        match self.requested_token_type {
            None => Ok(TokenType::AccessToken),
            Some(ref urn) => TokenType::from_urn(urn).ok_or_else(|| {
                TokenExchangeError::unsupported_token_type(&format!(
                    "Unknown requested_token_type: {urn}"
                ))
            }),
        }
    }

    /// Requested scopes, split on whitespace.
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Check the request-level parameters that need no token validation.
    pub fn check(&self) -> Result<(), TokenExchangeError> {
        if self.grant_type != GRANT_TYPE_TOKEN_EXCHANGE {
            return Err(TokenExchangeError::invalid_request(
                "grant_type must be urn:ietf:params:oauth:grant-type:token-exchange",
            ));
        }
        if self.subject_token.trim().is_empty() {
            return Err(TokenExchangeError::invalid_request(
                "subject_token must not be empty",
            ));
        }
        match (&self.actor_token, &self.actor_token_type) {
            (Some(_), None) => Err(TokenExchangeError::invalid_request(
                "actor_token_type is required when actor_token is present",
            )),
            (None, Some(_)) => Err(TokenExchangeError::invalid_request(
                "actor_token_type must not be present without actor_token",
            )),
            _ => Ok(()),
        }
    }
}

/// Parse form-urlencoded request body.
pub fn parse_exchange_request(body: &str) -> Result<TokenExchangeRequest, TokenExchangeError> {
    serde_urlencoded::from_str(body)
        .map_err(|e| TokenExchangeError::invalid_request(&format!("Invalid request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Atoken-exchange\
                        &subject_token=eyJhbGciOiJIUzI1NiJ9.e30.test\
                        &subject_token_type=urn%3Aietf%3Aparams%3Aoauth%3Atoken-type%3Ajwt";

    #[test]
    fn test_parse_exchange_request() {
        let request = parse_exchange_request(BODY).unwrap();
        assert_eq!(request.grant_type, GRANT_TYPE_TOKEN_EXCHANGE);
        assert_eq!(
            request.subject_token_type,
            "urn:ietf:params:oauth:token-type:jwt"
        );
        assert!(request.actor_token.is_none());
        assert!(request.check().is_ok());
        assert!(matches!(request.requested_type(), Ok(TokenType::AccessToken)));
    }

    #[test]
    fn test_parse_exchange_request_missing_field() {
        let err = parse_exchange_request("grant_type=x").unwrap_err();
        assert_eq!(err.error, "invalid_request");
    }

    #[test]
    fn test_invalid_grant_type() {
        let mut request = parse_exchange_request(BODY).unwrap();
        request.grant_type = "invalid".to_string();
        assert_eq!(request.check().unwrap_err().error, "invalid_request");
    }

    #[test]
    fn test_empty_subject_token() {
        let mut request = parse_exchange_request(BODY).unwrap();
        request.subject_token = "  ".to_string();
        assert_eq!(request.check().unwrap_err().error, "invalid_request");
    }

    #[test]
    fn test_actor_token_requires_type() {
        let mut request = parse_exchange_request(BODY).unwrap();
        request.actor_token = Some("token".to_string());
        assert_eq!(request.check().unwrap_err().error, "invalid_request");

        request.actor_token = None;
        request.actor_token_type = Some(TokenType::Jwt.as_urn().to_string());
        assert_eq!(request.check().unwrap_err().error, "invalid_request");
    }

    #[test]
    fn test_requested_type() {
        let mut request = parse_exchange_request(BODY).unwrap();
        request.requested_token_type = Some(TokenType::IdToken.as_urn().to_string());
        assert!(matches!(request.requested_type(), Ok(TokenType::IdToken)));

        request.requested_token_type = Some("urn:unknown:type".to_string());
        assert_eq!(
            request.requested_type().unwrap_err().error,
            "unsupported_token_type"
        );
    }

    #[test]
    fn test_requested_scopes() {
        let mut request = parse_exchange_request(BODY).unwrap();
        assert!(request.scopes().is_empty());
        request.scope = Some("read  write".to_string());
        assert_eq!(request.scopes(), vec!["read", "write"]);
    }
}
