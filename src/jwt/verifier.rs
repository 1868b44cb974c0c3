//! Signature verifier resolution.
//!
//! Resolves the verification key for a token from the tenant configuration
//! (static PEM key, shared secret, or JWKS URL) and checks the signature with
//! the verifier matching the key's family.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::time::Duration;

use super::compact::JoseHeader;
use super::jwks::JwksCache;
use crate::validation::{PublicKeyResolver, SignatureError, ValidationConfig};

/// Key family a verifier operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Hmac,
}

impl KeyFamily {
    /// Family of a JWS algorithm.
    pub fn of(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Some(KeyFamily::Rsa),
            Algorithm::ES256 | Algorithm::ES384 => Some(KeyFamily::Ec),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Some(KeyFamily::Hmac),
            _ => None,
        }
    }
}

/// A signature verifier bound to one key and algorithm.
pub struct SignatureVerifier {
    algorithm: Algorithm,
    key: DecodingKey,
}

/// Outcome of verifier resolution.
pub enum Resolution {
    /// No key is configured; verification cannot run.
    NoKeyConfigured,
    Verifier(SignatureVerifier),
}

impl SignatureVerifier {
    /// Resolve a verifier for the token header under the given configuration.
    pub async fn resolve(
        header: &JoseHeader,
        config: &ValidationConfig,
        jwks: &JwksCache,
    ) -> Result<Resolution, SignatureError> {
        let Some(material) = config.key_material() else {
            return Ok(Resolution::NoKeyConfigured);
        };

        let algorithm = Algorithm::from_str(&header.alg)
            .map_err(|_| SignatureError::UnsupportedAlgorithm(header.alg.clone()))?;
        let family = KeyFamily::of(algorithm)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(header.alg.clone()))?;

        let (key_family, key) = match config.public_key_resolver {
            PublicKeyResolver::JwksUrl => {
                let resolved = jwks
                    .resolve(
                        material.trim(),
                        header.kid.as_deref(),
                        Duration::from_secs(config.jwks_timeout_secs),
                        Duration::from_secs(config.jwks_cache_ttl_secs),
                    )
                    .await?;
                (resolved.family, resolved.key)
            }
            PublicKeyResolver::StaticKey => (family, static_key(material, family)?),
        };

        if key_family != family {
            return Err(SignatureError::UnsupportedAlgorithm(format!(
                "{} cannot be verified with a {:?} key",
                header.alg, key_family
            )));
        }

        Ok(Resolution::Verifier(SignatureVerifier { algorithm, key }))
    }

    /// Check the signature of a compact token.
    pub fn verify(&self, token: &str) -> Result<(), SignatureError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<serde_json::Value>(token.trim(), &self.key, &validation)
            .map(|_| ())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => SignatureError::Mismatch,
                ErrorKind::InvalidAlgorithm => {
                    SignatureError::UnsupportedAlgorithm(format!("{:?}", self.algorithm))
                }
                _ => SignatureError::Verification(e.to_string()),
            })
    }
}

/// Build a key from statically configured material.
///
/// PEM text is trimmed; an HMAC secret is used as configured.
fn static_key(material: &str, family: KeyFamily) -> Result<DecodingKey, SignatureError> {
    match family {
        KeyFamily::Rsa => DecodingKey::from_rsa_pem(material.trim().as_bytes())
            .map_err(|e| SignatureError::InvalidKey(format!("RSA public key: {e}"))),
        KeyFamily::Ec => DecodingKey::from_ec_pem(material.trim().as_bytes())
            .map_err(|e| SignatureError::InvalidKey(format!("EC public key: {e}"))),
        KeyFamily::Hmac => Ok(DecodingKey::from_secret(material.as_bytes())),
    }
}
