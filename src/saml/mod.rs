//! SAML assertion subject token validation.
//!
//! Assertions arrive Base64 (or Base64URL) encoded. Both versions share the
//! envelope decoding, XML document model and condition/audience extraction;
//! each validator walks its own element names and namespace.

pub mod assertion;
pub mod document;
pub mod saml1;
pub mod saml2;

pub use document::{XmlDocument, XmlElement};
pub use saml1::Saml1Validator;
pub use saml2::Saml2Validator;
