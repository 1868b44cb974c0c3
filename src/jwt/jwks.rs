//! JWKS (JSON Web Key Set) fetching and caching.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::verifier::KeyFamily;
use crate::validation::SignatureError;

/// Key sets fetched from JWKS endpoints, cached per URL.
pub struct JwksCache {
    /// Cached key sets: jwks url -> keys
    entries: RwLock<HashMap<String, CachedKeySet>>,
    /// HTTP client
    http_client: reqwest::Client,
}

struct CachedKeySet {
    keys: Vec<CachedKey>,
    fetched_at: Instant,
}

#[derive(Clone)]
struct CachedKey {
    kid: Option<String>,
    family: KeyFamily,
    key: DecodingKey,
}

/// A verification key selected from a key set.
pub struct ResolvedKey {
    pub family: KeyFamily,
    pub key: DecodingKey,
}

/// JWKS response from the endpoint.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JSON Web Key.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC, oct)
    pub kty: String,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm
    pub alg: Option<String>,
    /// Key use (sig, enc)
    #[serde(rename = "use")]
    pub key_use: Option<String>,

    // RSA parameters
    /// RSA modulus (base64url)
    pub n: Option<String>,
    /// RSA exponent (base64url)
    pub e: Option<String>,

    // EC parameters
    /// EC curve
    pub crv: Option<String>,
    /// EC x coordinate (base64url)
    pub x: Option<String>,
    /// EC y coordinate (base64url)
    pub y: Option<String>,

    // Symmetric parameters
    /// Key value (base64url)
    pub k: Option<String>,
}

impl JwksCache {
    /// Create a new, empty JWKS cache.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(http_client))
    }

    /// Create a cache that fetches with the given client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            http_client,
        }
    }

    /// Resolve the key for a token from the key set at `url`.
    ///
    /// Picks the key whose `kid` matches, falling back to the first key of the
    /// set. A `kid` that is missing from a cached set triggers one refetch
    /// before the fallback applies.
    pub async fn resolve(
        &self,
        url: &str,
        kid: Option<&str>,
        timeout: Duration,
        ttl: Duration,
    ) -> Result<ResolvedKey, SignatureError> {
        let cached = self.cached_keys(url, ttl);
        let from_cache = cached.is_some();

        let mut keys = match cached {
            Some(keys) => keys,
            None => self.refresh(url, timeout, ttl).await?,
        };

        if from_cache {
            if let Some(kid) = kid {
                if !keys.iter().any(|k| k.kid.as_deref() == Some(kid)) {
                    debug!(kid = %kid, "Key not found in cache, refreshing JWKS");
                    keys = self.refresh(url, timeout, ttl).await?;
                }
            }
        }

        select_key(&keys, kid)
            .map(|k| ResolvedKey {
                family: k.family,
                key: k.key.clone(),
            })
            .ok_or(SignatureError::NoKeyFound)
    }

    /// Drop every cached key set.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached_keys(&self, url: &str, ttl: Duration) -> Option<Vec<CachedKey>> {
        if ttl.is_zero() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(url)
            .filter(|set| set.fetched_at.elapsed() < ttl)
            .map(|set| set.keys.clone())
    }

    async fn refresh(
        &self,
        url: &str,
        timeout: Duration,
        ttl: Duration,
    ) -> Result<Vec<CachedKey>, SignatureError> {
        let keys = self
            .fetch(url, timeout)
            .await
            .map_err(|e| SignatureError::Jwks(format!("{e:#}")))?;

        if !ttl.is_zero() {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(
                url.to_string(),
                CachedKeySet {
                    keys: keys.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        info!(url = %url, key_count = keys.len(), "JWKS fetched");
        Ok(keys)
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<CachedKey>> {
        debug!(url = %url, "Fetching JWKS");

        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .context("Failed to fetch JWKS")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "JWKS endpoint returned status {}",
                response.status()
            ));
        }

        let jwks: Jwks = response.json().await.context("Failed to parse JWKS")?;

        let mut keys = Vec::with_capacity(jwks.keys.len());
        for jwk in jwks.keys {
            // Skip encryption keys
            if jwk.key_use.as_deref() == Some("enc") {
                continue;
            }

            match jwk_to_decoding_key(&jwk) {
                Ok((family, key)) => {
                    debug!(kid = ?jwk.kid, kty = %jwk.kty, alg = ?jwk.alg, "Loaded JWK");
                    keys.push(CachedKey {
                        kid: jwk.kid.clone(),
                        family,
                        key,
                    });
                }
                Err(e) => {
                    warn!(
                        kid = ?jwk.kid,
                        kty = %jwk.kty,
                        error = %e,
                        "Failed to parse JWK, skipping"
                    );
                }
            }
        }

        Ok(keys)
    }
}

fn select_key<'a>(keys: &'a [CachedKey], kid: Option<&str>) -> Option<&'a CachedKey> {
    kid.and_then(|kid| keys.iter().find(|k| k.kid.as_deref() == Some(kid)))
        .or_else(|| keys.first())
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(KeyFamily, DecodingKey)> {
    match jwk.kty.as_str() {
        "RSA" => {
            let n = jwk.n.as_ref().ok_or_else(|| anyhow!("RSA key missing 'n'"))?;
            let e = jwk.e.as_ref().ok_or_else(|| anyhow!("RSA key missing 'e'"))?;

            let key = DecodingKey::from_rsa_components(n, e)
                .context("Failed to create RSA DecodingKey")?;
            Ok((KeyFamily::Rsa, key))
        }
        "EC" => {
            let x = jwk.x.as_ref().ok_or_else(|| anyhow!("EC key missing 'x'"))?;
            let y = jwk.y.as_ref().ok_or_else(|| anyhow!("EC key missing 'y'"))?;
            let crv = jwk
                .crv
                .as_ref()
                .ok_or_else(|| anyhow!("EC key missing 'crv'"))?;

            match crv.as_str() {
                "P-256" | "P-384" => {
                    let key = DecodingKey::from_ec_components(x, y)
                        .context("Failed to create EC DecodingKey")?;
                    Ok((KeyFamily::Ec, key))
                }
                _ => Err(anyhow!("Unsupported EC curve: {}", crv)),
            }
        }
        "oct" => {
            let k = jwk.k.as_ref().ok_or_else(|| anyhow!("oct key missing 'k'"))?;
            let secret = URL_SAFE_NO_PAD
                .decode(k)
                .context("Failed to decode oct key value")?;
            Ok((KeyFamily::Hmac, DecodingKey::from_secret(&secret)))
        }
        kty => Err(anyhow!("Unsupported key type: {}", kty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jwks_document, EC_KID, RSA_KID};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);
    const TTL: Duration = Duration::from_secs(300);

    async fn serve_jwks(expected_fetches: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document()))
            .expect(expected_fetches)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_jwk_parsing() {
        let jwk: Jwk = serde_json::from_value(jwks_document()["keys"][0].clone()).unwrap();
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid.as_deref(), Some(RSA_KID));

        let (family, _) = jwk_to_decoding_key(&jwk).unwrap();
        assert_eq!(family, KeyFamily::Rsa);
    }

    #[test]
    fn test_unsupported_jwk_types() {
        let okp: Jwk = serde_json::from_str(r#"{"kty": "OKP", "crv": "Ed25519", "x": "AA"}"#)
            .unwrap();
        assert!(jwk_to_decoding_key(&okp).is_err());

        let curve: Jwk =
            serde_json::from_str(r#"{"kty": "EC", "crv": "P-521", "x": "AA", "y": "AA"}"#)
                .unwrap();
        assert!(jwk_to_decoding_key(&curve).is_err());

        let rsa: Jwk = serde_json::from_str(r#"{"kty": "RSA", "e": "AQAB"}"#).unwrap();
        assert!(jwk_to_decoding_key(&rsa).is_err());
    }

    #[tokio::test]
    async fn test_resolve_by_kid() {
        let server = serve_jwks(1).await;
        let url = format!("{}/jwks.json", server.uri());
        let cache = JwksCache::new().unwrap();

        let key = cache.resolve(&url, Some(EC_KID), TIMEOUT, TTL).await.unwrap();
        assert_eq!(key.family, KeyFamily::Ec);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_first_key() {
        let server = serve_jwks(1).await;
        let url = format!("{}/jwks.json", server.uri());
        let cache = JwksCache::new().unwrap();

        let key = cache.resolve(&url, None, TIMEOUT, TTL).await.unwrap();
        assert_eq!(key.family, KeyFamily::Rsa);
    }

    #[tokio::test]
    async fn test_cached_key_set_is_reused() {
        let server = serve_jwks(1).await;
        let url = format!("{}/jwks.json", server.uri());
        let cache = JwksCache::new().unwrap();

        cache.resolve(&url, Some(RSA_KID), TIMEOUT, TTL).await.unwrap();
        cache.resolve(&url, Some(EC_KID), TIMEOUT, TTL).await.unwrap();
        // Mock expectation (exactly one fetch) is verified when the server drops.
    }

    #[tokio::test]
    async fn test_unknown_kid_refetches_once_then_falls_back() {
        let server = serve_jwks(2).await;
        let url = format!("{}/jwks.json", server.uri());
        let cache = JwksCache::new().unwrap();

        cache.resolve(&url, Some(RSA_KID), TIMEOUT, TTL).await.unwrap();
        let key = cache
            .resolve(&url, Some("rotated-away"), TIMEOUT, TTL)
            .await
            .unwrap();
        assert_eq!(key.family, KeyFamily::Rsa);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let server = serve_jwks(2).await;
        let url = format!("{}/jwks.json", server.uri());
        let cache = JwksCache::new().unwrap();

        cache.resolve(&url, None, TIMEOUT, Duration::ZERO).await.unwrap();
        cache.resolve(&url, None, TIMEOUT, Duration::ZERO).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_key_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})),
            )
            .mount(&server)
            .await;
        let url = format!("{}/jwks.json", server.uri());

        let cache = JwksCache::new().unwrap();
        let result = cache.resolve(&url, None, TIMEOUT, TTL).await;
        assert!(matches!(result, Err(SignatureError::NoKeyFound)));
    }

    #[tokio::test]
    async fn test_endpoint_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let url = format!("{}/jwks.json", server.uri());

        let cache = JwksCache::new().unwrap();
        let result = cache.resolve(&url, None, TIMEOUT, TTL).await;
        match result {
            Err(SignatureError::Jwks(msg)) => assert!(msg.contains("503")),
            _ => panic!("expected JWKS fetch error"),
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_document())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let url = format!("{}/jwks.json", server.uri());

        let cache = JwksCache::new().unwrap();
        let result = cache
            .resolve(&url, None, Duration::from_millis(100), TTL)
            .await;
        assert!(matches!(result, Err(SignatureError::Jwks(_))));
    }
}
