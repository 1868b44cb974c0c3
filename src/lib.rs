//! Subject token validation for OAuth 2.0 Token Exchange (RFC 8693).
//!
//! A [`SubjectTokenValidatorFactory`] maps token type URNs to
//! [`SubjectTokenValidator`]s. Each validator turns a raw subject or actor
//! token into a normalized [`ValidatedToken`], enforcing the tenant's
//! [`ValidationConfig`]: trusted issuers, signature verification, the
//! validity window and the delegation chain depth limit.
//!
//! Supported encodings:
//! - JWT, ID token and refresh token ([`jwt::JwtValidator`])
//! - access token ([`jwt::AccessTokenValidator`])
//! - SAML 1.1 and 2.0 assertions ([`saml::Saml1Validator`], [`saml::Saml2Validator`])
//!
//! The [`exchange`] module is the grant handler's side of the contract: it
//! parses exchange requests, runs the validators and maps their failures to
//! RFC 8693 `invalid_grant` responses.

pub mod exchange;
pub mod factory;
pub mod jwt;
pub mod saml;
pub mod validation;

#[cfg(test)]
mod testing;

pub use factory::SubjectTokenValidatorFactory;
pub use validation::{
    Clock, FixedClock, PublicKeyResolver, SignatureError, SubjectTokenValidator, SystemClock,
    TokenType, ValidatedToken, ValidationConfig, ValidationConfigJson, ValidationError,
};
