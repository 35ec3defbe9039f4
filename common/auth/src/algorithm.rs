use std::collections::HashSet;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::error::ConfigError;

/// Algorithm used when configuration leaves it unset.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Every algorithm the service is willing to sign or verify with.
pub const SUPPORTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::HS256,
    Algorithm::HS384,
    Algorithm::HS512,
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
];

const RSA_KEY_BITS: usize = 2048;

/// Kind and size of key material an algorithm needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Symmetric { bits: usize },
    Asymmetric { bits: usize },
}

const KEY_FAMILIES: &[(Algorithm, KeyFamily)] = &[
    (Algorithm::HS256, KeyFamily::Symmetric { bits: 256 }),
    (Algorithm::HS384, KeyFamily::Symmetric { bits: 384 }),
    (Algorithm::HS512, KeyFamily::Symmetric { bits: 512 }),
    (Algorithm::RS256, KeyFamily::Asymmetric { bits: RSA_KEY_BITS }),
    (Algorithm::RS384, KeyFamily::Asymmetric { bits: RSA_KEY_BITS }),
    (Algorithm::RS512, KeyFamily::Asymmetric { bits: RSA_KEY_BITS }),
];

impl KeyFamily {
    pub fn for_algorithm(algorithm: Algorithm) -> Result<Self, ConfigError> {
        KEY_FAMILIES
            .iter()
            .find(|(candidate, _)| *candidate == algorithm)
            .map(|(_, family)| *family)
            .ok_or_else(|| ConfigError::UnsupportedKeyFamily(algorithm_name(algorithm).to_string()))
    }

    pub fn bits(&self) -> usize {
        match self {
            KeyFamily::Symmetric { bits } | KeyFamily::Asymmetric { bits } => *bits,
        }
    }
}

pub fn default_supported_algorithms() -> HashSet<Algorithm> {
    SUPPORTED_ALGORITHMS.iter().copied().collect()
}

/// Parses a JWS algorithm name such as `HS256`.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    Algorithm::from_str(name.trim()).map_err(|_| ConfigError::UnknownAlgorithm(name.to_string()))
}

/// JWS name of an algorithm, as it appears in a token header.
pub fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::EdDSA => "EdDSA",
    }
}
