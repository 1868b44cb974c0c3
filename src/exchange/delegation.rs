//! Subject and actor validation for a token exchange.
//!
//! Produces the validated identities and the RFC 8693 `act` chain the
//! exchanged token must carry. Minting that token is left to the caller.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::error::TokenExchangeError;
use super::request::TokenExchangeRequest;
use crate::factory::SubjectTokenValidatorFactory;
use crate::validation::claims::delegation_depth;
use crate::validation::{TokenType, ValidatedToken, ValidationConfig, ValidationError};

/// Outcome of a validated token exchange request.
#[derive(Debug, Clone)]
pub struct ValidatedExchange {
    /// The validated subject token.
    pub subject: ValidatedToken,
    /// The validated actor token, when one was presented.
    pub actor: Option<ValidatedToken>,
    /// Token type the caller should issue.
    pub requested_type: TokenType,
    /// Delegation chain for the exchanged token.
    pub act: Option<Value>,
}

impl ValidatedExchange {
    /// Claims the exchanged token carries over from the validated tokens.
    pub fn carried_claims(&self) -> Map<String, Value> {
        let mut claims = Map::new();
        if let Some(sub) = self.subject.subject() {
            claims.insert("sub".into(), Value::String(sub.to_string()));
        }
        if let Some(client_id) = self.subject.client_id() {
            claims.insert("client_id".into(), Value::String(client_id.to_string()));
        }
        if let Some(ref act) = self.act {
            claims.insert("act".into(), act.clone());
        }
        claims
    }
}

/// Validate the subject and optional actor token of an exchange request.
pub async fn validate_exchange(
    validators: &SubjectTokenValidatorFactory,
    config: &ValidationConfig,
    request: &TokenExchangeRequest,
) -> Result<ValidatedExchange, TokenExchangeError> {
    request.check()?;
    let requested_type = request.requested_type()?;

    debug!(
        subject_token_type = %request.subject_token_type,
        actor_token_type = ?request.actor_token_type,
        requested_token_type = %requested_type.as_urn(),
        "Validating token exchange"
    );

    let subject = validate(
        validators,
        &request.subject_token,
        &request.subject_token_type,
        config,
        "subject",
    )
    .await?;

    let actor = match (&request.actor_token, &request.actor_token_type) {
        (Some(token), Some(token_type)) => {
            let actor = validate(validators, token, token_type, config, "actor").await?;
            check_may_act(&subject, &actor)?;
            Some(actor)
        }
        _ => None,
    };

    let act = match actor {
        Some(ref actor) => Some(actor_claim(actor, subject.act_claim())),
        None => subject.act_claim().cloned(),
    };
    if let Some(ref act) = act {
        check_chain_depth(act, config)?;
    }

    info!(
        subject = ?subject.subject(),
        actor = ?actor.as_ref().and_then(|a| a.subject()),
        from_type = %request.subject_token_type,
        "Token exchange validated"
    );

    Ok(ValidatedExchange {
        subject,
        actor,
        requested_type,
        act,
    })
}

async fn validate(
    validators: &SubjectTokenValidatorFactory,
    token: &str,
    token_type: &str,
    config: &ValidationConfig,
    role: &'static str,
) -> Result<ValidatedToken, TokenExchangeError> {
    let result = match validators.get_validator(token_type) {
        Ok(validator) => validator.validate(token, config).await,
        Err(e) => Err(e),
    };
    result.map_err(|e| {
        warn!(role, token_type = %token_type, error = %e, "Token validation failed");
        e.into()
    })
}

/// When the subject names an authorized actor in `may_act`, the actor must
/// match it.
fn check_may_act(
    subject: &ValidatedToken,
    actor: &ValidatedToken,
) -> Result<(), TokenExchangeError> {
    let Some(allowed) = subject
        .may_act_claim()
        .and_then(|may_act| may_act.get("sub"))
        .and_then(Value::as_str)
    else {
        return Ok(());
    };

    if actor.subject() == Some(allowed) {
        Ok(())
    } else {
        warn!(
            allowed_actor = %allowed,
            actor = ?actor.subject(),
            "Actor is not authorized by may_act"
        );
        Err(TokenExchangeError::invalid_grant(
            "Actor is not authorized to act on behalf of the subject",
        ))
    }
}

/// The chain handed to the caller obeys the same limit as validated tokens.
fn check_chain_depth(act: &Value, config: &ValidationConfig) -> Result<(), ValidationError> {
    let max = config.max_delegation_chain_depth;
    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    let depth = delegation_depth(Some(act), limit);
    if depth >= limit {
        warn!(depth, max, "Exchanged delegation chain would exceed limit");
        return Err(ValidationError::DelegationDepthExceeded { depth, max });
    }
    Ok(())
}

/// Build the `act` claim for a token issued to `actor` on behalf of a
/// subject whose token carried `prior` as its delegation chain.
///
/// The current actor is outermost; earlier actors nest under `act`.
pub fn actor_claim(actor: &ValidatedToken, prior: Option<&Value>) -> Value {
    let mut act = Map::new();
    if let Some(sub) = actor.subject() {
        act.insert("sub".into(), Value::String(sub.to_string()));
    }
    if let Some(iss) = actor.issuer() {
        act.insert("iss".into(), Value::String(iss.to_string()));
    }
    if let Some(client_id) = actor.client_id() {
        act.insert("client_id".into(), Value::String(client_id.to_string()));
    }
    if let Some(prior) = prior.filter(|p| !p.is_null()) {
        act.insert("act".into(), prior.clone());
    }
    Value::Object(act)
}
