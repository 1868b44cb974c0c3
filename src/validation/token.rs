//! Normalized result of a successful validation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Immutable, normalized view of a validated subject or actor token.
///
/// Built once at the end of a successful `validate` call through
/// [`ValidatedToken::builder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedToken {
    subject: Option<String>,
    issuer: Option<String>,
    claims: Map<String, Value>,
    scopes: BTreeSet<String>,
    expiration: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
    token_id: Option<String>,
    audience: Vec<String>,
    act_claim: Option<Value>,
    may_act_claim: Option<Value>,
    client_id: Option<String>,
    token_type: String,
    domain: Option<String>,
}

impl ValidatedToken {
    /// Start building a result for the given token type URN.
    pub fn builder(token_type: impl Into<String>) -> ValidatedTokenBuilder {
        ValidatedTokenBuilder {
            token: ValidatedToken {
                subject: None,
                issuer: None,
                claims: Map::new(),
                scopes: BTreeSet::new(),
                expiration: None,
                issued_at: None,
                not_before: None,
                token_id: None,
                audience: Vec::new(),
                act_claim: None,
                may_act_claim: None,
                client_id: None,
                token_type: token_type.into(),
                domain: None,
            },
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Full original claim (or attribute) set.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// JWT ID (`jti`).
    pub fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }

    /// Audiences in document/array order.
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Raw `act` claim, not flattened.
    pub fn act_claim(&self) -> Option<&Value> {
        self.act_claim.as_ref()
    }

    /// Raw `may_act` claim, not flattened.
    pub fn may_act_claim(&self) -> Option<&Value> {
        self.may_act_claim.as_ref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Token type URN.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Tenant identifier (access tokens only).
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Whether the expiration lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the not-before time lies strictly after `now`.
    pub fn is_not_yet_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|nbf| nbf > now)
    }

    pub fn is_not_yet_valid(&self) -> bool {
        self.is_not_yet_valid_at(Utc::now())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

/// Builder for [`ValidatedToken`].
#[derive(Debug, Clone)]
pub struct ValidatedTokenBuilder {
    token: ValidatedToken,
}

impl ValidatedTokenBuilder {
    pub fn subject(mut self, subject: Option<String>) -> Self {
        self.token.subject = subject;
        self
    }

    pub fn issuer(mut self, issuer: Option<String>) -> Self {
        self.token.issuer = issuer;
        self
    }

    pub fn claims(mut self, claims: Map<String, Value>) -> Self {
        self.token.claims = claims;
        self
    }

    pub fn scopes(mut self, scopes: BTreeSet<String>) -> Self {
        self.token.scopes = scopes;
        self
    }

    pub fn expiration(mut self, expiration: Option<DateTime<Utc>>) -> Self {
        self.token.expiration = expiration;
        self
    }

    pub fn issued_at(mut self, issued_at: Option<DateTime<Utc>>) -> Self {
        self.token.issued_at = issued_at;
        self
    }

    pub fn not_before(mut self, not_before: Option<DateTime<Utc>>) -> Self {
        self.token.not_before = not_before;
        self
    }

    pub fn token_id(mut self, token_id: Option<String>) -> Self {
        self.token.token_id = token_id;
        self
    }

    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.token.audience = audience;
        self
    }

    pub fn act_claim(mut self, act: Option<Value>) -> Self {
        self.token.act_claim = act;
        self
    }

    pub fn may_act_claim(mut self, may_act: Option<Value>) -> Self {
        self.token.may_act_claim = may_act;
        self
    }

    pub fn client_id(mut self, client_id: Option<String>) -> Self {
        self.token.client_id = client_id;
        self
    }

    pub fn domain(mut self, domain: Option<String>) -> Self {
        self.token.domain = domain;
        self
    }

    pub fn build(self) -> ValidatedToken {
        self.token
    }
}
