//! JWT-family subject token validation.
//!
//! Covers generic JWTs, OpenID Connect ID tokens, refresh tokens and access
//! tokens, with signature verification against a static key or a JWKS
//! endpoint.

pub mod access_token;
pub mod compact;
pub mod jwks;
pub mod validator;
pub mod verifier;

pub use access_token::AccessTokenValidator;
pub use compact::{CompactToken, JoseHeader};
pub use jwks::JwksCache;
pub use validator::JwtValidator;
pub use verifier::{KeyFamily, SignatureVerifier};
