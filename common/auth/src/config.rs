use std::collections::HashSet;
use std::fmt;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::algorithm::default_supported_algorithms;

/// Raw JWT configuration, before any key material is resolved.
#[derive(Clone)]
pub struct JwtConfig {
    /// Expected issuer claim (iss).
    pub issuer: String,
    /// Expected audience claim (aud).
    pub audience: String,
    /// JWS algorithm name. Defaults to HS256 when unset.
    pub algorithm: Option<String>,
    pub supported_algorithms: HashSet<Algorithm>,
    pub token_lifetime: Duration,
    /// Allowable clock skew when validating exp/nbf.
    pub clock_skew: Duration,
    /// Base64 encoded secret for HMAC algorithms.
    pub secret_base64: Option<String>,
    /// PEM encoded RSA private key (PKCS#8 or PKCS#1).
    pub rsa_private_key_pem: Option<String>,
    /// PEM encoded RSA public key, for deployments that only verify.
    pub rsa_public_key_pem: Option<String>,
}

impl JwtConfig {
    /// Construct config with defaults: 30 minute tokens, 5 second skew, generated key.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm: None,
            supported_algorithms: default_supported_algorithms(),
            token_lifetime: Duration::minutes(30),
            clock_skew: Duration::seconds(5),
            secret_base64: None,
            rsa_private_key_pem: None,
            rsa_public_key_pem: None,
        }
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn with_supported_algorithms<I>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = Algorithm>,
    {
        self.supported_algorithms = algorithms.into_iter().collect();
        self
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Adjust the allowed clock skew.
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    pub fn with_secret_base64(mut self, secret: impl Into<String>) -> Self {
        self.secret_base64 = Some(secret.into());
        self
    }

    pub fn with_rsa_private_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.rsa_private_key_pem = Some(pem.into());
        self
    }

    pub fn with_rsa_public_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.rsa_public_key_pem = Some(pem.into());
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("supported_algorithms", &self.supported_algorithms)
            .field("token_lifetime", &self.token_lifetime)
            .field("clock_skew", &self.clock_skew)
            .field("secret_base64", &self.secret_base64.as_ref().map(|_| "[REDACTED]"))
            .field(
                "rsa_private_key_pem",
                &self.rsa_private_key_pem.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rsa_public_key_pem", &self.rsa_public_key_pem.is_some())
            .finish()
    }
}
