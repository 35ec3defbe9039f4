use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::debug;

use crate::algorithm::algorithm_name;
use crate::claims::{Identity, IssuedClaims};
use crate::error::{ConfigError, IssueError};
use crate::settings::JwtSettings;

/// A signed token in compact serialization.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

pub struct TokenIssuer {
    settings: Arc<JwtSettings>,
    encoding_key: EncodingKey,
    header: Header,
}

impl TokenIssuer {
    pub fn new(settings: Arc<JwtSettings>) -> Result<Self, ConfigError> {
        let encoding_key = settings.key().encoding_key().cloned().ok_or_else(|| {
            ConfigError::VerifyOnlyKey(algorithm_name(settings.algorithm()).to_string())
        })?;

        let mut header = Header::new(settings.algorithm());
        header.typ = Some("JWT".to_string());

        Ok(Self {
            settings,
            encoding_key,
            header,
        })
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    pub fn issue(&self, identity: &Identity) -> Result<Token, IssueError> {
        self.issue_at(identity, Utc::now())
    }

    /// Signs a token for `identity` as if issued at `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Token, IssueError> {
        let issued_at = now.timestamp();
        let expires_at = now
            .checked_add_signed(self.settings.token_lifetime())
            .ok_or(IssueError::ExpiryOutOfRange)?
            .timestamp();

        let claims = IssuedClaims {
            iss: self.settings.issuer(),
            aud: self.settings.audience(),
            sub: identity.subject(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
        };

        let token = encode(&self.header, &claims, &self.encoding_key)?;
        debug!(
            algorithm = algorithm_name(self.settings.algorithm()),
            expires_at, "issued JWT"
        );
        Ok(Token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{Duration, TimeZone};
    use rand_core::OsRng;
    use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
    use rsa::RsaPrivateKey;
    use serde_json::Value;

    fn decode_segment(segment: &str) -> Value {
        let bytes = URL_SAFE_NO_PAD.decode(segment).expect("base64url segment");
        serde_json::from_slice(&bytes).expect("json segment")
    }

    #[test]
    fn token_carries_registered_claims() {
        let config = JwtConfig::new("sample-issuer", "sample-audience")
            .with_token_lifetime(Duration::minutes(10));
        let settings = Arc::new(JwtSettings::initialize(&config).expect("settings"));
        let issuer = TokenIssuer::new(settings).expect("issuer");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("timestamp");

        let token = issuer.issue_at(&Identity::new("admin"), now).expect("token");
        let segments: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(segments.len(), 3);

        let header = decode_segment(segments[0]);
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");

        let payload = decode_segment(segments[1]);
        assert_eq!(payload["iss"], "sample-issuer");
        assert_eq!(payload["aud"], "sample-audience");
        assert_eq!(payload["sub"], "admin");
        assert_eq!(payload["iat"], now.timestamp());
        assert_eq!(payload["nbf"], now.timestamp());
        assert_eq!(payload["exp"], now.timestamp() + 600);
    }

    #[test]
    fn verify_only_settings_cannot_issue() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation");
        let public_pem = private_key
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("public pem");
        let config = JwtConfig::new("iss", "aud")
            .with_algorithm("RS256")
            .with_rsa_public_key_pem(public_pem);
        let settings = Arc::new(JwtSettings::initialize(&config).expect("settings"));

        let err = TokenIssuer::new(settings).err().expect("should fail");
        assert!(matches!(err, ConfigError::VerifyOnlyKey(alg) if alg == "RS256"));
    }

    #[test]
    fn expiry_overflow_is_an_issue_error() {
        let config = JwtConfig::new("iss", "aud");
        let settings = Arc::new(JwtSettings::initialize(&config).expect("settings"));
        let issuer = TokenIssuer::new(settings).expect("issuer");

        let err = issuer
            .issue_at(&Identity::new("admin"), DateTime::<Utc>::MAX_UTC)
            .expect_err("should fail");
        assert!(matches!(err, IssueError::ExpiryOutOfRange));
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token("abc.def.ghi".to_string());
        assert_eq!(format!("{token:?}"), "Token([REDACTED])");
        assert_eq!(token.to_string(), "abc.def.ghi");
    }
}
