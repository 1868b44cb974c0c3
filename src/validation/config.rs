//! Per-tenant validation configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the verification key for JWT signatures is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicKeyResolver {
    /// `public_key` holds a PEM key (RSA/EC) or a shared secret (HMAC).
    #[default]
    StaticKey,
    /// `public_key` holds a JWKS endpoint URL.
    JwksUrl,
}

/// Subject token validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Accepted issuers. Empty means any issuer is accepted.
    #[serde(default)]
    pub trusted_issuers: BTreeSet<String>,

    /// Tokens whose `act` chain is at least this deep are rejected.
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_chain_depth: u32,

    /// Verify JWT signatures.
    #[serde(default = "default_true")]
    pub validate_signature: bool,

    /// Key resolution mode.
    #[serde(default)]
    pub public_key_resolver: PublicKeyResolver,

    /// PEM key, shared secret or JWKS URL depending on `public_key_resolver`.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Fail instead of skipping verification when no key is configured.
    #[serde(default)]
    pub require_signature_key: bool,

    /// Leeway in seconds for expiry and not-before checks.
    #[serde(default)]
    pub clock_skew_secs: u64,

    /// Timeout for a single JWKS fetch.
    #[serde(default = "default_jwks_timeout")]
    pub jwks_timeout_secs: u64,

    /// How long a fetched key set is reused. 0 disables caching.
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

fn default_max_delegation_depth() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_jwks_timeout() -> u64 {
    10
}

fn default_jwks_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            trusted_issuers: BTreeSet::new(),
            max_delegation_chain_depth: default_max_delegation_depth(),
            validate_signature: true,
            public_key_resolver: PublicKeyResolver::default(),
            public_key: None,
            require_signature_key: false,
            clock_skew_secs: 0,
            jwks_timeout_secs: default_jwks_timeout(),
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

impl ValidationConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.public_key_resolver == PublicKeyResolver::JwksUrl {
            if let Some(ref url) = self.public_key {
                let url = url.trim();
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err("JWKS public_key must be a valid HTTP(S) URL".to_string());
                }
            }
        }

        if self.require_signature_key && !self.validate_signature {
            return Err("require_signature_key has no effect when validate_signature is false"
                .to_string());
        }

        if self.jwks_timeout_secs == 0 {
            return Err("jwks_timeout_secs must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Whether the issuer passes the trusted issuer allow-list.
    pub fn is_issuer_trusted(&self, issuer: Option<&str>) -> bool {
        if self.trusted_issuers.is_empty() {
            return true;
        }
        issuer.is_some_and(|iss| self.trusted_issuers.contains(iss))
    }

    /// Configured key material exactly as given; only an empty string counts
    /// as absent.
    ///
    /// Shared secrets are used byte for byte, so trimming is left to the PEM
    /// and JWKS URL consumers.
    pub fn key_material(&self) -> Option<&str> {
        self.public_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// JSON configuration for dynamic reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationConfigJson {
    pub trusted_issuers: Option<Vec<String>>,
    pub max_delegation_chain_depth: Option<u32>,
    pub validate_signature: Option<bool>,
    pub public_key_resolver: Option<PublicKeyResolver>,
    pub public_key: Option<String>,
    pub require_signature_key: Option<bool>,
    pub clock_skew_secs: Option<u64>,
    pub jwks_timeout_secs: Option<u64>,
    pub jwks_cache_ttl_secs: Option<u64>,
}

impl ValidationConfigJson {
    /// Apply JSON config to existing config.
    pub fn apply_to(&self, config: &mut ValidationConfig) {
        if let Some(ref issuers) = self.trusted_issuers {
            config.trusted_issuers = issuers.iter().cloned().collect();
        }
        if let Some(depth) = self.max_delegation_chain_depth {
            config.max_delegation_chain_depth = depth;
        }
        if let Some(validate) = self.validate_signature {
            config.validate_signature = validate;
        }
        if let Some(resolver) = self.public_key_resolver {
            config.public_key_resolver = resolver;
        }
        if let Some(ref key) = self.public_key {
            config.public_key = Some(key.clone());
        }
        if let Some(require) = self.require_signature_key {
            config.require_signature_key = require;
        }
        if let Some(skew) = self.clock_skew_secs {
            config.clock_skew_secs = skew;
        }
        if let Some(timeout) = self.jwks_timeout_secs {
            config.jwks_timeout_secs = timeout;
        }
        if let Some(ttl) = self.jwks_cache_ttl_secs {
            config.jwks_cache_ttl_secs = ttl;
        }
    }
}
