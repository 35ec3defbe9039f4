use std::collections::HashSet;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use tracing::info;

use crate::algorithm::{algorithm_name, parse_algorithm, DEFAULT_ALGORITHM};
use crate::allowlist::AlgorithmAllowlist;
use crate::config::JwtConfig;
use crate::error::ConfigError;
use crate::keys::{self, SigningKey};

/// Longest token lifetime accepted at startup, in seconds (366 days).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;
/// Largest clock skew accepted at startup, in seconds (one day).
pub const MAX_CLOCK_SKEW_SECS: i64 = 24 * 60 * 60;

/// Resolved JWT settings shared by the issuer, validator and gates.
///
/// The only way to obtain one is [`JwtSettings::initialize`], so the key always
/// matches the configured algorithm.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    algorithm: Algorithm,
    supported_algorithms: HashSet<Algorithm>,
    issuer: String,
    audience: String,
    token_lifetime: Duration,
    clock_skew: Duration,
    key: SigningKey,
}

impl JwtSettings {
    pub fn initialize(config: &JwtConfig) -> Result<Self, ConfigError> {
        let algorithm = match config.algorithm.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => parse_algorithm(name)?,
            _ => DEFAULT_ALGORITHM,
        };

        if !config.supported_algorithms.contains(&algorithm) {
            return Err(ConfigError::UnsupportedAlgorithm(
                algorithm_name(algorithm).to_string(),
            ));
        }
        let max_lifetime = Duration::seconds(MAX_TOKEN_LIFETIME_SECS);
        if config.token_lifetime <= Duration::zero() || config.token_lifetime > max_lifetime {
            return Err(ConfigError::InvalidSetting(
                "token_lifetime",
                config.token_lifetime.to_string(),
            ));
        }
        let max_skew = Duration::seconds(MAX_CLOCK_SKEW_SECS);
        if config.clock_skew < Duration::zero() || config.clock_skew > max_skew {
            return Err(ConfigError::InvalidSetting(
                "clock_skew",
                config.clock_skew.to_string(),
            ));
        }

        let key = keys::provision(config, algorithm)?;

        info!(
            algorithm = algorithm_name(algorithm),
            issuer = %config.issuer,
            audience = %config.audience,
            can_sign = key.can_sign(),
            "JWT settings initialized"
        );

        Ok(Self {
            algorithm,
            supported_algorithms: config.supported_algorithms.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            token_lifetime: config.token_lifetime,
            clock_skew: config.clock_skew,
            key,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn supported_algorithms(&self) -> &HashSet<Algorithm> {
        &self.supported_algorithms
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    /// Allowlist over the supported algorithms, backed by the default provider.
    pub fn allowlist(&self) -> AlgorithmAllowlist {
        AlgorithmAllowlist::new(self.supported_algorithms.iter().copied())
    }
}
