//! SAML 1.1 assertion validation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::assertion::{
    assertion_claims, assertion_root, collect_audiences, require_field, validity_window,
};
use super::document::{XmlDocument, XmlElement};
use crate::validation::claims::{check_trusted_issuer, check_validity_window};
use crate::validation::{
    Clock, SubjectTokenValidator, TokenType, ValidatedToken, ValidationConfig, ValidationError,
};

pub const SAML1_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:1.0:assertion";

/// Statement elements that may carry the assertion's `Subject`.
const SUBJECT_STATEMENTS: [&str; 4] = [
    "AuthenticationStatement",
    "AttributeStatement",
    "AuthorizationDecisionStatement",
    "SubjectStatement",
];

/// Validates Base64-encoded SAML 1.1 assertions.
///
/// The issuer is the root `Issuer` attribute and the subject is
/// `Subject/NameIdentifier`, looked up directly under the assertion first and
/// then inside its subject statements. XML signatures are not checked.
pub struct Saml1Validator {
    clock: Arc<dyn Clock>,
}

impl Saml1Validator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

fn find_subject<'a>(assertion: &XmlElement<'a>) -> Option<XmlElement<'a>> {
    if let Some(subject) = assertion.first_matching_child(SAML1_ASSERTION_NS, "Subject") {
        return Some(subject);
    }
    SUBJECT_STATEMENTS.iter().find_map(|statement| {
        assertion
            .children(SAML1_ASSERTION_NS, statement)
            .find_map(|s| s.first_matching_child(SAML1_ASSERTION_NS, "Subject"))
    })
}

#[async_trait]
impl SubjectTokenValidator for Saml1Validator {
    async fn validate(
        &self,
        token: &str,
        config: &ValidationConfig,
    ) -> Result<ValidatedToken, ValidationError> {
        let document = XmlDocument::from_envelope(token)?;
        let root = assertion_root(&document, SAML1_ASSERTION_NS, "1.1")?;

        let issuer = require_field(root.attribute("Issuer"), "Issuer")?;
        check_trusted_issuer(Some(&issuer), config)?;

        let subject = find_subject(&root)
            .and_then(|s| s.first_matching_child(SAML1_ASSERTION_NS, "NameIdentifier"))
            .map(|e| e.text());
        let subject = require_field(subject, "Subject")?;

        let conditions = root.first_matching_child(SAML1_ASSERTION_NS, "Conditions");
        let (not_before, not_on_or_after) = validity_window(conditions);
        check_validity_window(self.clock.now(), not_before, not_on_or_after, true, config)?;

        let audience =
            collect_audiences(conditions, SAML1_ASSERTION_NS, "AudienceRestrictionCondition");

        debug!(
            subject = %subject,
            issuer = %issuer,
            audiences = audience.len(),
            "SAML 1.1 assertion validated"
        );

        Ok(ValidatedToken::builder(TokenType::Saml1.as_urn())
            .claims(assertion_claims(&subject, &issuer, &audience))
            .subject(Some(subject))
            .issuer(Some(issuer))
            .audience(audience)
            .build())
    }

    fn supported_token_type(&self) -> &str {
        TokenType::Saml1.as_urn()
    }
}
