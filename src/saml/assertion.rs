//! Extraction helpers shared by the SAML 1.1 and 2.0 validators.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::document::{XmlDocument, XmlElement};
use crate::validation::ValidationError;

/// Return the root element if it is an `Assertion` in `namespace`.
pub fn assertion_root<'a>(
    document: &'a XmlDocument,
    namespace: &str,
    version: &str,
) -> Result<XmlElement<'a>, ValidationError> {
    let root = document.root();
    if root.is(namespace, "Assertion") {
        Ok(root)
    } else {
        Err(ValidationError::InvalidFormat(format!(
            "invalid SAML assertion: root element is not a SAML {version} Assertion"
        )))
    }
}

/// Require a non-blank value for a mandatory assertion field.
pub fn require_field(
    value: Option<&str>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// `NotBefore` and `NotOnOrAfter` of a `Conditions` element.
///
/// Unparseable instants are treated as absent.
pub fn validity_window(
    conditions: Option<XmlElement<'_>>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let Some(conditions) = conditions else {
        return (None, None);
    };
    (
        parse_instant(&conditions, "NotBefore"),
        parse_instant(&conditions, "NotOnOrAfter"),
    )
}

fn parse_instant(element: &XmlElement<'_>, attribute: &str) -> Option<DateTime<Utc>> {
    let value = element.attribute(attribute)?.trim();
    if value.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(instant) => Some(instant.with_timezone(&Utc)),
        Err(e) => {
            debug!(attribute, value, error = %e, "Ignoring unparseable SAML instant");
            None
        }
    }
}

/// Audiences from every `restriction` child of `Conditions`, in document
/// order without duplicates.
pub fn collect_audiences(
    conditions: Option<XmlElement<'_>>,
    namespace: &str,
    restriction: &str,
) -> Vec<String> {
    let mut audiences: Vec<String> = Vec::new();
    let Some(conditions) = conditions else {
        return audiences;
    };

    let mut current = conditions.first_matching_child(namespace, restriction);
    while let Some(element) = current {
        let mut audience = element.first_matching_child(namespace, "Audience");
        while let Some(value) = audience {
            let text = value.text();
            if !text.is_empty() && !audiences.iter().any(|a| a == text) {
                audiences.push(text.to_string());
            }
            audience = value.next_matching_sibling(namespace, "Audience");
        }
        current = element.next_matching_sibling(namespace, restriction);
    }

    audiences
}

/// Claim map of a validated assertion: `sub`, `iss` and, when present, `aud`.
pub fn assertion_claims(subject: &str, issuer: &str, audience: &[String]) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("sub".into(), Value::String(subject.to_string()));
    claims.insert("iss".into(), Value::String(issuer.to_string()));
    if !audience.is_empty() {
        claims.insert(
            "aud".into(),
            Value::Array(audience.iter().cloned().map(Value::String).collect()),
        );
    }
    claims
}
