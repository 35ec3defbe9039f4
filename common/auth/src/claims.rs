use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// The authenticated subject of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            issued_at: None,
            expires_at: None,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Registered claims written into every issued token.
#[derive(Debug, Serialize)]
pub(crate) struct IssuedClaims<'a> {
    pub iss: &'a str,
    pub aud: &'a str,
    pub sub: &'a str,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Registered claims as read from an incoming token payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ClaimsRepr {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<AudienceRepr>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl AudienceRepr {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            AudienceRepr::Single(item) => item == audience,
            AudienceRepr::Many(items) => items.iter().any(|item| item == audience),
        }
    }
}

impl TryFrom<serde_json::Value> for ClaimsRepr {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        serde_json::from_value(value).map_err(|err| AuthError::Malformed(err.to_string()))
    }
}

pub(crate) fn timestamp(seconds: i64, claim: &'static str) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| AuthError::Malformed(format!("invalid {claim} claim '{seconds}'")))
}
