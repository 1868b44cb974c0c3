//! Access token validation.

use async_trait::async_trait;
use std::sync::Arc;

use super::jwks::JwksCache;
use super::validator::JwtValidator;
use crate::validation::{
    Clock, SubjectTokenValidator, TokenType, ValidatedToken, ValidationConfig, ValidationError,
};

/// Validates JWT access tokens.
///
/// Delegates to [`JwtValidator`] and additionally carries the tenant `domain`
/// claim into the result.
pub struct AccessTokenValidator {
    inner: JwtValidator,
}

impl AccessTokenValidator {
    pub fn new(clock: Arc<dyn Clock>, jwks: Arc<JwksCache>) -> Self {
        Self {
            inner: JwtValidator::new(TokenType::AccessToken, clock, jwks),
        }
    }
}

#[async_trait]
impl SubjectTokenValidator for AccessTokenValidator {
    async fn validate(
        &self,
        token: &str,
        config: &ValidationConfig,
    ) -> Result<ValidatedToken, ValidationError> {
        self.inner.validate_token(token, config, true).await
    }

    fn supported_token_type(&self) -> &str {
        TokenType::AccessToken.as_urn()
    }
}
