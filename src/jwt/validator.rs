//! JWT subject token validation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::compact::CompactToken;
use super::jwks::JwksCache;
use super::verifier::{Resolution, SignatureVerifier};
use crate::validation::claims::{
    check_delegation_depth, check_trusted_issuer, check_validity_window, extract_audience,
    extract_scopes, string_claim, timestamp_claim,
};
use crate::validation::{
    Clock, SignatureError, SubjectTokenValidator, TokenType, ValidatedToken, ValidationConfig,
    ValidationError,
};

/// Validates JWT-encoded subject tokens.
///
/// One implementation backs the `jwt`, `id_token` and `refresh_token`
/// registry entries; the token type it reports is fixed at construction.
pub struct JwtValidator {
    token_type: TokenType,
    clock: Arc<dyn Clock>,
    jwks: Arc<JwksCache>,
}

impl JwtValidator {
    pub fn new(token_type: TokenType, clock: Arc<dyn Clock>, jwks: Arc<JwksCache>) -> Self {
        Self {
            token_type,
            clock,
            jwks,
        }
    }

    /// Run the full validation sequence.
    ///
    /// `with_domain` additionally lifts the `domain` claim into the result.
    pub(crate) async fn validate_token(
        &self,
        token: &str,
        config: &ValidationConfig,
        with_domain: bool,
    ) -> Result<ValidatedToken, ValidationError> {
        let parsed = CompactToken::parse(token)?;
        let claims = parsed.claims;

        let issuer = string_claim(&claims, "iss");
        check_trusted_issuer(issuer.as_deref(), config)?;

        if config.validate_signature {
            match SignatureVerifier::resolve(&parsed.header, config, &self.jwks).await? {
                Resolution::Verifier(verifier) => verifier.verify(token)?,
                Resolution::NoKeyConfigured if config.require_signature_key => {
                    return Err(SignatureError::NoKeyFound.into());
                }
                Resolution::NoKeyConfigured => {
                    warn!(
                        token_type = %self.token_type,
                        issuer = ?issuer,
                        "No verification key configured, skipping JWT signature verification"
                    );
                }
            }
        }

        let expiration = timestamp_claim(&claims, "exp")?;
        let not_before = timestamp_claim(&claims, "nbf")?;
        let issued_at = timestamp_claim(&claims, "iat")?;
        check_validity_window(self.clock.now(), not_before, expiration, false, config)?;

        let scopes = extract_scopes(&claims);
        check_delegation_depth(&claims, config)?;

        let subject = string_claim(&claims, "sub");
        debug!(
            token_type = %self.token_type,
            subject = ?subject,
            issuer = ?issuer,
            scopes = scopes.len(),
            "JWT subject token validated"
        );

        let domain = if with_domain {
            string_claim(&claims, "domain")
        } else {
            None
        };

        Ok(ValidatedToken::builder(self.token_type.as_urn())
            .subject(subject)
            .issuer(issuer)
            .scopes(scopes)
            .expiration(expiration)
            .issued_at(issued_at)
            .not_before(not_before)
            .token_id(string_claim(&claims, "jti"))
            .audience(extract_audience(&claims))
            .act_claim(claims.get("act").cloned())
            .may_act_claim(claims.get("may_act").cloned())
            .client_id(string_claim(&claims, "client_id"))
            .domain(domain)
            .claims(claims)
            .build())
    }
}

#[async_trait]
impl SubjectTokenValidator for JwtValidator {
    async fn validate(
        &self,
        token: &str,
        config: &ValidationConfig,
    ) -> Result<ValidatedToken, ValidationError> {
        self.validate_token(token, config, false).await
    }

    fn supported_token_type(&self) -> &str {
        self.token_type.as_urn()
    }

    fn supports(&self, token_type: &str) -> bool {
        token_type == self.token_type.as_urn()
            || token_type == TokenType::Jwt.as_urn()
            || token_type == TokenType::IdToken.as_urn()
    }
}
