//! SAML 2.0 assertion validation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::assertion::{
    assertion_claims, assertion_root, collect_audiences, require_field, validity_window,
};
use super::document::XmlDocument;
use crate::validation::claims::{check_trusted_issuer, check_validity_window};
use crate::validation::{
    Clock, SubjectTokenValidator, TokenType, ValidatedToken, ValidationConfig, ValidationError,
};

pub const SAML2_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// Validates Base64-encoded SAML 2.0 assertions.
///
/// The issuer is the `Issuer` child element and the subject is
/// `Subject/NameID`. XML signatures are not checked.
pub struct Saml2Validator {
    clock: Arc<dyn Clock>,
}

impl Saml2Validator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl SubjectTokenValidator for Saml2Validator {
    async fn validate(
        &self,
        token: &str,
        config: &ValidationConfig,
    ) -> Result<ValidatedToken, ValidationError> {
        let document = XmlDocument::from_envelope(token)?;
        let root = assertion_root(&document, SAML2_ASSERTION_NS, "2.0")?;

        let issuer = root
            .first_matching_child(SAML2_ASSERTION_NS, "Issuer")
            .map(|e| e.text());
        let issuer = require_field(issuer, "Issuer")?;
        check_trusted_issuer(Some(&issuer), config)?;

        let subject = root
            .first_matching_child(SAML2_ASSERTION_NS, "Subject")
            .and_then(|s| s.first_matching_child(SAML2_ASSERTION_NS, "NameID"))
            .map(|e| e.text());
        let subject = require_field(subject, "Subject")?;

        let conditions = root.first_matching_child(SAML2_ASSERTION_NS, "Conditions");
        let (not_before, not_on_or_after) = validity_window(conditions);
        check_validity_window(self.clock.now(), not_before, not_on_or_after, true, config)?;

        let audience = collect_audiences(conditions, SAML2_ASSERTION_NS, "AudienceRestriction");

        debug!(
            subject = %subject,
            issuer = %issuer,
            audiences = audience.len(),
            "SAML 2.0 assertion validated"
        );

        Ok(ValidatedToken::builder(TokenType::Saml2.as_urn())
            .claims(assertion_claims(&subject, &issuer, &audience))
            .subject(Some(subject))
            .issuer(Some(issuer))
            .audience(audience)
            .build())
    }

    fn supported_token_type(&self) -> &str {
        TokenType::Saml2.as_urn()
    }
}
