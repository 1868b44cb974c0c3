//! Claim extraction and checks shared by all validators.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use super::config::ValidationConfig;
use super::error::ValidationError;

/// Reject issuers outside the configured allow-list.
pub fn check_trusted_issuer(
    issuer: Option<&str>,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    if config.is_issuer_trusted(issuer) {
        return Ok(());
    }
    debug!(issuer = ?issuer, "Issuer not in trusted issuer list");
    Err(ValidationError::UntrustedIssuer {
        issuer: issuer.map(String::from),
    })
}

/// Check the validity window.
///
/// A token is expired once `expires_at` lies strictly before `now`
/// (`inclusive_expiry` = false, JWT `exp`) or at/after it (`inclusive_expiry` =
/// true, SAML `NotOnOrAfter`). It is not yet valid while `not_before` lies
/// strictly after `now`. The configured clock skew widens both bounds.
pub fn check_validity_window(
    now: DateTime<Utc>,
    not_before: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    inclusive_expiry: bool,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    let skew = i64::try_from(config.clock_skew_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX);

    if let Some(exp) = expires_at {
        let deadline = exp.checked_add_signed(skew).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let expired = if inclusive_expiry {
            now >= deadline
        } else {
            now > deadline
        };
        if expired {
            return Err(ValidationError::Expired);
        }
    }

    if let Some(nbf) = not_before {
        let earliest = nbf.checked_sub_signed(skew).unwrap_or(DateTime::<Utc>::MIN_UTC);
        if now < earliest {
            return Err(ValidationError::NotYetValid);
        }
    }

    Ok(())
}

/// Extract the `scope` claim.
///
/// A string is split on runs of whitespace, an array contributes each string
/// element. Anything else yields no scopes.
pub fn extract_scopes(claims: &Map<String, Value>) -> BTreeSet<String> {
    match claims.get("scope") {
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(String::from)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Extract the `aud` claim as an ordered list.
pub fn extract_audience(claims: &Map<String, Value>) -> Vec<String> {
    match claims.get("aud") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// String-valued claim.
pub fn string_claim(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(String::from)
}

/// NumericDate claim (seconds since the epoch).
///
/// Absent or `null` claims yield `None`; any other non-numeric value is a
/// format error. Values beyond the representable range clamp to the nearest
/// bound, so an `exp` in the far future never expires.
pub fn timestamp_claim(
    claims: &Map<String, Value>,
    name: &str,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let value = match claims.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    let secs = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
        .ok_or_else(|| ValidationError::InvalidFormat(format!("{name} claim must be numeric")))?;

    let timestamp = DateTime::from_timestamp(secs, 0).unwrap_or(if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    });
    Ok(Some(timestamp))
}

/// Depth of the nested `act` chain. No `act` claim is depth 0.
///
/// Walks iteratively and stops as soon as `limit` is reached, so the cost is
/// bounded by the configured maximum rather than by the input.
pub fn delegation_depth(act: Option<&Value>, limit: usize) -> usize {
    let mut depth = 0;
    let mut current = act;

    while let Some(actor) = current {
        if actor.is_null() {
            break;
        }
        depth += 1;
        if depth >= limit {
            break;
        }
        current = actor.get("act");
    }

    depth
}

/// Reject delegation chains at or beyond the configured maximum.
///
/// A maximum of N admits chains of depth N-1, so a maximum of 0 rejects
/// every token, including those without an `act` claim.
pub fn check_delegation_depth(
    claims: &Map<String, Value>,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    let max = config.max_delegation_chain_depth;
    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    let depth = delegation_depth(claims.get("act"), limit);

    if depth >= limit {
        return Err(ValidationError::DelegationDepthExceeded { depth, max });
    }
    Ok(())
}
