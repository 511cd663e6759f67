//! Decoding of the bearer credential's claims.
//!
//! The credential is a JWT issued by the API. Only the payload segment is
//! decoded here: the signature is the API's concern, and the client only needs
//! the claims to route the user.
//!
//! Two views exist. [`SessionClaims`] is what the gate routes on: any JSON
//! object payload is accepted and only `profile`, `questionnaire`, `role` and
//! `exp` are consulted. [`Claims`] is the strict view that rebuilds a full
//! [`User`] record. Both reject a token whose `exp` is in the past.

use crate::api::types::{Role, User};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a json object")]
    NotObject,
    #[error("token expired")]
    Expired,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Routing view of a credential's payload. Every field is optional and kept
/// loosely typed; the issuer owns the schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionClaims {
    pub id: Option<Value>,
    pub role: Option<Role>,
    pub profile: Option<Value>,
    pub questionnaire: Option<Value>,
    pub exp: Option<i64>,
}

impl SessionClaims {
    fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            id: present(payload, "id").cloned(),
            role: present(payload, "role")
                .and_then(|role| Role::deserialize(role).ok()),
            profile: present(payload, "profile").cloned(),
            questionnaire: present(payload, "questionnaire").cloned(),
            exp: expiry(payload),
        }
    }

    /// Bio, age and gender must all be truthy: missing, `null`, `""`, `0`
    /// and `false` count as absent.
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.profile.as_ref().is_some_and(|profile| {
            ["bio", "age", "gender"]
                .iter()
                .all(|field| profile.get(field).is_some_and(truthy))
        })
    }

    #[must_use]
    pub fn questionnaire_complete(&self) -> bool {
        self.questionnaire.is_some()
    }
}

fn present<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|value| !value.is_null())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn expiry(payload: &Map<String, Value>) -> Option<i64> {
    let exp = payload.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs.floor() as i64))
}

/// Splits the JWT, decodes the payload segment and checks `exp`.
fn payload_at(token: &str, now_unix_seconds: i64) -> Result<Map<String, Value>, Error> {
    let mut parts = token.trim().split('.');
    let _header = parts.next().ok_or(Error::TokenFormat)?;
    let payload = parts.next().ok_or(Error::TokenFormat)?;
    let _signature = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() || payload.is_empty() {
        return Err(Error::TokenFormat);
    }

    // Some issuers pad their segments; unpadded decoding would reject them.
    let bytes =
        Base64UrlUnpadded::decode_vec(payload.trim_end_matches('=')).map_err(|_| Error::Base64)?;
    let Value::Object(payload) = serde_json::from_slice::<Value>(&bytes)? else {
        return Err(Error::NotObject);
    };

    if expiry(&payload).is_some_and(|exp| exp <= now_unix_seconds) {
        return Err(Error::Expired);
    }

    Ok(payload)
}

/// Decode the routing claims of a JWT, checking `exp` against
/// `now_unix_seconds`.
///
/// # Errors
///
/// Returns an error if the token does not have three segments, the payload is
/// not a base64url JSON object, or the token has expired.
pub fn decode_session_at(token: &str, now_unix_seconds: i64) -> Result<SessionClaims, Error> {
    payload_at(token, now_unix_seconds).map(|payload| SessionClaims::from_payload(&payload))
}

/// Decode the full user claims of a JWT, checking `exp` against
/// `now_unix_seconds`.
///
/// # Errors
///
/// As [`decode_session_at`], and additionally if the payload does not carry
/// a complete user record.
pub fn decode_at(token: &str, now_unix_seconds: i64) -> Result<Claims, Error> {
    let payload = payload_at(token, now_unix_seconds)?;
    Ok(serde_json::from_value(Value::Object(payload))?)
}

/// Decode the claims of a JWT against the system clock.
///
/// # Errors
///
/// See [`decode_at`].
pub fn decode(token: &str) -> Result<Claims, Error> {
    decode_at(token, now_unix_seconds())
}

#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
