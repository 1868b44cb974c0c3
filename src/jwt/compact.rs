//! Compact JWS parsing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::validation::ValidationError;

/// JOSE header fields used for key resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct JoseHeader {
    /// Signing algorithm as declared by the token.
    pub alg: String,
    /// Key ID.
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// A compact token split into its decoded parts.
#[derive(Debug, Clone)]
pub struct CompactToken {
    pub header: JoseHeader,
    pub claims: Map<String, Value>,
}

impl CompactToken {
    /// Parse `header.payload.signature`.
    ///
    /// The signature segment is only checked for well-formed Base64URL here;
    /// verifying it is the job of the verifier.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ValidationError::InvalidFormat(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let header: JoseHeader = decode_segment(header, "header")?;
        let claims: Map<String, Value> = decode_segment(payload, "payload")?;

        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| ValidationError::InvalidFormat(format!("signature: {e}")))?;

        Ok(Self { header, claims })
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &str,
) -> Result<T, ValidationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| ValidationError::InvalidFormat(format!("{name}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError::InvalidFormat(format!("{name}: {e}")))
}
