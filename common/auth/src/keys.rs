use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rand_core::{OsRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{info, warn};

use crate::algorithm::{algorithm_name, KeyFamily};
use crate::config::JwtConfig;
use crate::error::ConfigError;

/// Key material resolved for the configured algorithm.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Secret(Vec<u8>),
    RsaKeyPair(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
}

/// Signing/verification key held for the lifetime of the process.
#[derive(Clone)]
pub struct SigningKey {
    material: KeyMaterial,
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: Vec<u8>) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            encoding: Some(EncodingKey::from_secret(&secret)),
            decoding: DecodingKey::from_secret(&secret),
            material: KeyMaterial::Secret(secret),
        })
    }

    pub fn from_rsa_private(private_key: RsaPrivateKey) -> Result<Self, ConfigError> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|err| ConfigError::InvalidKeyPair(err.to_string()))?;
        let encoding = EncodingKey::from_rsa_der(der.as_bytes());
        let decoding = rsa_decoding_key(&private_key.to_public_key())?;
        Ok(Self {
            material: KeyMaterial::RsaKeyPair(private_key),
            encoding: Some(encoding),
            decoding,
        })
    }

    pub fn from_rsa_public(public_key: RsaPublicKey) -> Result<Self, ConfigError> {
        let decoding = rsa_decoding_key(&public_key)?;
        Ok(Self {
            material: KeyMaterial::RsaPublic(public_key),
            encoding: None,
            decoding,
        })
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self.material, KeyMaterial::Secret(_))
    }

    pub fn can_sign(&self) -> bool {
        self.encoding.is_some()
    }

    pub fn encoding_key(&self) -> Option<&EncodingKey> {
        self.encoding.as_ref()
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.material == other.material
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.material {
            KeyMaterial::Secret(_) => "secret",
            KeyMaterial::RsaKeyPair(_) => "rsa_key_pair",
            KeyMaterial::RsaPublic(_) => "rsa_public",
        };
        f.debug_struct("SigningKey")
            .field("kind", &kind)
            .field("material", &"[REDACTED]")
            .finish()
    }
}

fn rsa_decoding_key(public_key: &RsaPublicKey) -> Result<DecodingKey, ConfigError> {
    let modulus = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let exponent = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
    DecodingKey::from_rsa_components(&modulus, &exponent)
        .map_err(|err| ConfigError::InvalidKeyPair(err.to_string()))
}

/// Resolves the key for `algorithm`, decoding supplied material or generating fresh keys.
pub fn provision(config: &JwtConfig, algorithm: Algorithm) -> Result<SigningKey, ConfigError> {
    let name = algorithm_name(algorithm);
    match KeyFamily::for_algorithm(algorithm)? {
        KeyFamily::Symmetric { bits } => match non_blank(&config.secret_base64) {
            Some(encoded) => {
                let secret = STANDARD.decode(encoded)?;
                if secret.len() * 8 < bits {
                    warn!(
                        algorithm = name,
                        secret_bits = secret.len() * 8,
                        "configured secret is shorter than the algorithm's hash size"
                    );
                }
                info!(algorithm = name, "using configured HMAC secret");
                SigningKey::from_secret(secret)
            }
            None => {
                warn!(algorithm = name, bits, "generating ephemeral HMAC secret");
                SigningKey::from_secret(generate_secret(bits))
            }
        },
        KeyFamily::Asymmetric { bits } => {
            if let Some(pem) = non_blank(&config.rsa_private_key_pem) {
                info!(algorithm = name, "using configured RSA key pair");
                return SigningKey::from_rsa_private(parse_rsa_private_pem(pem)?);
            }
            if let Some(pem) = non_blank(&config.rsa_public_key_pem) {
                info!(algorithm = name, "using configured RSA public key (verify only)");
                return SigningKey::from_rsa_public(parse_rsa_public_pem(pem)?);
            }
            warn!(algorithm = name, bits, "generating ephemeral RSA key pair");
            let private_key = RsaPrivateKey::new(&mut OsRng, bits)
                .map_err(|err| ConfigError::KeyGeneration(err.to_string()))?;
            SigningKey::from_rsa_private(private_key)
        }
    }
}

fn generate_secret(bits: usize) -> Vec<u8> {
    let mut secret = vec![0u8; bits / 8];
    OsRng.fill_bytes(&mut secret);
    secret
}

fn parse_rsa_private_pem(pem: &str) -> Result<RsaPrivateKey, ConfigError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|err| ConfigError::InvalidKeyPair(err.to_string()))
}

fn parse_rsa_public_pem(pem: &str) -> Result<RsaPublicKey, ConfigError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|err| ConfigError::InvalidKeyPair(err.to_string()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
