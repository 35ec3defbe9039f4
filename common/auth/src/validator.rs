use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::crypto;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::allowlist::{AlgorithmAllowlist, CryptoProvider, JsonWebTokenProvider};
use crate::claims::{timestamp, ClaimsRepr, Identity};
use crate::error::{AuthError, AuthResult};
use crate::settings::JwtSettings;

/// Tokens larger than this are rejected before any decoding.
const MAX_TOKEN_BYTES: usize = 4096;

#[derive(Debug, Deserialize)]
struct HeaderRepr {
    alg: String,
}

struct ParsedToken<'a> {
    signing_input: &'a str,
    signature: &'a str,
    algorithm: String,
    payload: Value,
}

/// Verifies bearer tokens against the process settings.
pub struct TokenValidator<P = JsonWebTokenProvider> {
    settings: Arc<JwtSettings>,
    allowlist: AlgorithmAllowlist<P>,
}

impl TokenValidator<JsonWebTokenProvider> {
    pub fn new(settings: Arc<JwtSettings>) -> Self {
        let allowlist = settings.allowlist();
        Self {
            settings,
            allowlist,
        }
    }
}

impl<P: CryptoProvider> TokenValidator<P> {
    pub fn with_allowlist(settings: Arc<JwtSettings>, allowlist: AlgorithmAllowlist<P>) -> Self {
        Self {
            settings,
            allowlist,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    pub fn validate(&self, token: &str) -> AuthResult<Identity> {
        self.validate_at(token, Utc::now())
    }

    /// Validates `token` as if the current time were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Identity> {
        let parsed = parse_compact(token)?;

        let key = self.settings.key();
        let algorithm = self
            .allowlist
            .permitted_algorithm(&parsed.algorithm, key)
            .ok_or_else(|| AuthError::AlgorithmRejected(parsed.algorithm.clone()))?;

        let verified = crypto::verify(
            parsed.signature,
            parsed.signing_input.as_bytes(),
            key.decoding_key(),
            algorithm,
        )
        .unwrap_or(false);
        if !verified {
            return Err(AuthError::BadSignature);
        }

        let claims = ClaimsRepr::try_from(parsed.payload)?;

        if claims.iss.as_deref() != Some(self.settings.issuer()) {
            return Err(AuthError::IssuerMismatch);
        }
        let audience_matches = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(self.settings.audience()));
        if !audience_matches {
            return Err(AuthError::AudienceMismatch);
        }

        let skew = self.settings.clock_skew();
        let exp = claims
            .exp
            .ok_or_else(|| AuthError::Malformed("missing exp claim".to_string()))?;
        let expires_at = timestamp(exp, "exp")?;
        let earliest = now.checked_sub_signed(skew).ok_or(AuthError::Expired)?;
        if expires_at < earliest {
            return Err(AuthError::Expired);
        }
        if let Some(nbf) = claims.nbf {
            let latest = now
                .checked_add_signed(skew)
                .ok_or_else(|| AuthError::Malformed("clock out of range".to_string()))?;
            if timestamp(nbf, "nbf")? > latest {
                return Err(AuthError::NotYetValid);
            }
        }

        let subject = claims
            .sub
            .ok_or_else(|| AuthError::Malformed("missing sub claim".to_string()))?;
        let issued_at = claims.iat.map(|iat| timestamp(iat, "iat")).transpose()?;

        debug!(algorithm = %parsed.algorithm, "verified JWT successfully");
        Ok(Identity {
            subject,
            issued_at,
            expires_at: Some(expires_at),
        })
    }
}

fn parse_compact(token: &str) -> AuthResult<ParsedToken<'_>> {
    if token.len() > MAX_TOKEN_BYTES {
        return Err(AuthError::Malformed(format!(
            "token exceeds {MAX_TOKEN_BYTES} bytes"
        )));
    }

    let (signing_input, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| AuthError::Malformed("expected three segments".to_string()))?;
    let (header, payload) = signing_input
        .split_once('.')
        .ok_or_else(|| AuthError::Malformed("expected three segments".to_string()))?;
    if payload.contains('.') || signature.is_empty() {
        return Err(AuthError::Malformed("expected three segments".to_string()));
    }

    let header: HeaderRepr = decode_segment(header, "header")?;
    let payload: Value = decode_segment(payload, "payload")?;
    if !payload.is_object() {
        return Err(AuthError::Malformed("payload is not a JSON object".to_string()));
    }

    Ok(ParsedToken {
        signing_input,
        signature,
        algorithm: header.alg,
        payload,
    })
}

fn decode_segment<T>(segment: &str, name: &str) -> AuthResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|err| AuthError::Malformed(format!("{name} is not base64url: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| AuthError::Malformed(format!("{name} is not valid JSON: {err}")))
}
