//! Token Exchange (RFC 8693) consumer surface.
//!
//! Parses the grant request, validates the subject (and optional actor)
//! token through the validator factory and maps failures to RFC 8693 error
//! responses. The resulting delegation chain is returned for the caller to
//! place in the token it issues.

mod delegation;
mod error;
mod request;

pub use delegation::{actor_claim, validate_exchange, ValidatedExchange};
pub use error::TokenExchangeError;
pub use request::{parse_exchange_request, TokenExchangeRequest, GRANT_TYPE_TOKEN_EXCHANGE};
