//! Subject token validator registry.
//!
//! Maps token type URNs to validators. Lookup is an exact match on the
//! registered URN, falling back to asking each validator, in registration
//! order, whether it [`supports`](SubjectTokenValidator::supports) the type.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::jwt::{AccessTokenValidator, JwksCache, JwtValidator};
use crate::saml::{Saml1Validator, Saml2Validator};
use crate::validation::{Clock, SubjectTokenValidator, SystemClock, TokenType, ValidationError};

#[derive(Default)]
struct Registry {
    by_type: HashMap<String, Arc<dyn SubjectTokenValidator>>,
    /// Registration order, used for the `supports` fallback.
    order: Vec<String>,
}

impl Registry {
    fn insert(&mut self, token_type: String, validator: Arc<dyn SubjectTokenValidator>) {
        if self.by_type.insert(token_type.clone(), validator).is_none() {
            self.order.push(token_type);
        }
    }

    fn find(&self, token_type: &str) -> Option<Arc<dyn SubjectTokenValidator>> {
        if let Some(validator) = self.by_type.get(token_type) {
            return Some(Arc::clone(validator));
        }
        self.order
            .iter()
            .filter_map(|key| self.by_type.get(key))
            .find(|validator| validator.supports(token_type))
            .map(Arc::clone)
    }
}

/// Registry of subject token validators keyed by token type URN.
pub struct SubjectTokenValidatorFactory {
    registry: RwLock<Registry>,
}

impl SubjectTokenValidatorFactory {
    /// Create a factory with the default validators on the wall clock.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a factory with the default validators on the given clock.
    ///
    /// All JWT-family validators share one JWKS cache.
    pub fn with_clock(clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let jwks = Arc::new(JwksCache::new()?);
        Ok(Self::with_defaults(clock, jwks))
    }

    /// Create a factory with the default validators using an existing JWKS
    /// cache.
    pub fn with_defaults(clock: Arc<dyn Clock>, jwks: Arc<JwksCache>) -> Self {
        let factory = Self::empty();

        let jwt = |token_type| Arc::new(JwtValidator::new(token_type, clock.clone(), jwks.clone()));
        factory.register(TokenType::Jwt, jwt(TokenType::Jwt));
        factory.register(TokenType::IdToken, jwt(TokenType::IdToken));
        factory.register(
            TokenType::AccessToken,
            Arc::new(AccessTokenValidator::new(clock.clone(), jwks.clone())),
        );
        factory.register(TokenType::RefreshToken, jwt(TokenType::RefreshToken));
        factory.register(TokenType::Saml1, Arc::new(Saml1Validator::new(clock.clone())));
        factory.register(TokenType::Saml2, Arc::new(Saml2Validator::new(clock)));

        factory
    }

    /// Create a factory with no validators registered.
    pub fn empty() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    fn register(&self, token_type: TokenType, validator: Arc<dyn SubjectTokenValidator>) {
        self.register_validator(token_type.as_urn(), validator);
    }

    /// Validator for a token type URN.
    pub fn get_validator(
        &self,
        token_type: &str,
    ) -> Result<Arc<dyn SubjectTokenValidator>, ValidationError> {
        self.read()
            .find(token_type)
            .ok_or_else(|| ValidationError::UnsupportedTokenType(token_type.to_string()))
    }

    /// Add or replace the validator for a token type URN.
    pub fn register_validator(
        &self,
        token_type: impl Into<String>,
        validator: Arc<dyn SubjectTokenValidator>,
    ) {
        let token_type = token_type.into();
        debug!(token_type = %token_type, "Registering subject token validator");
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token_type, validator);
    }

    /// Whether [`get_validator`](Self::get_validator) would succeed.
    pub fn has_validator(&self, token_type: &str) -> bool {
        self.read().find(token_type).is_some()
    }

    /// Registered token type URNs, in registration order.
    pub fn supported_token_types(&self) -> Vec<String> {
        self.read().order.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }
}
