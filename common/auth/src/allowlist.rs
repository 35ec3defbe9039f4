use std::collections::HashSet;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::keys::SigningKey;

/// Reports which signature algorithms can be used with a given key.
pub trait CryptoProvider: Send + Sync {
    fn is_supported_algorithm(&self, algorithm: &str, key: &SigningKey) -> bool;
}

/// Everything jsonwebtoken can do with the key type, with no further restriction.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWebTokenProvider;

impl CryptoProvider for JsonWebTokenProvider {
    fn is_supported_algorithm(&self, algorithm: &str, key: &SigningKey) -> bool {
        let Ok(algorithm) = Algorithm::from_str(algorithm) else {
            return false;
        };

        if key.is_symmetric() {
            matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
        } else {
            matches!(
                algorithm,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            )
        }
    }
}

/// Restricts a provider to a fixed set of algorithms, whatever a token header asks for.
#[derive(Debug, Clone)]
pub struct AlgorithmAllowlist<P = JsonWebTokenProvider> {
    allowed: HashSet<Algorithm>,
    inner: P,
}

impl AlgorithmAllowlist<JsonWebTokenProvider> {
    pub fn new<I>(allowed: I) -> Self
    where
        I: IntoIterator<Item = Algorithm>,
    {
        Self::with_provider(allowed, JsonWebTokenProvider)
    }
}

impl<P: CryptoProvider> AlgorithmAllowlist<P> {
    pub fn with_provider<I>(allowed: I, inner: P) -> Self
    where
        I: IntoIterator<Item = Algorithm>,
    {
        Self {
            allowed: allowed.into_iter().collect(),
            inner,
        }
    }

    /// Returns the algorithm only if it is allowlisted and usable with `key`.
    pub fn permitted_algorithm(&self, algorithm: &str, key: &SigningKey) -> Option<Algorithm> {
        let parsed = Algorithm::from_str(algorithm).ok()?;
        (self.allowed.contains(&parsed) && self.inner.is_supported_algorithm(algorithm, key))
            .then_some(parsed)
    }

    pub fn is_algorithm_permitted(&self, algorithm: &str, key: &SigningKey) -> bool {
        self.permitted_algorithm(algorithm, key).is_some()
    }
}

impl<P: CryptoProvider> CryptoProvider for AlgorithmAllowlist<P> {
    fn is_supported_algorithm(&self, algorithm: &str, key: &SigningKey) -> bool {
        self.is_algorithm_permitted(algorithm, key)
    }
}
