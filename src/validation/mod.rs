//! Subject token validation contract.
//!
//! Every supported token encoding is validated by a [`SubjectTokenValidator`]
//! which turns a raw token into a normalized [`ValidatedToken`] or fails with
//! a [`ValidationError`].

pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod token;
pub mod token_type;

use async_trait::async_trait;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PublicKeyResolver, ValidationConfig, ValidationConfigJson};
pub use error::{SignatureError, ValidationError};
pub use token::{ValidatedToken, ValidatedTokenBuilder};
pub use token_type::TokenType;

/// Validates one kind of subject (or actor) token.
#[async_trait]
pub trait SubjectTokenValidator: Send + Sync {
    /// Validate a raw token against the tenant configuration.
    async fn validate(
        &self,
        token: &str,
        config: &ValidationConfig,
    ) -> Result<ValidatedToken, ValidationError>;

    /// Token type URN this validator reports in its results.
    fn supported_token_type(&self) -> &str;

    /// Whether this validator can handle the given token type URN.
    fn supports(&self, token_type: &str) -> bool {
        token_type == self.supported_token_type()
    }
}
