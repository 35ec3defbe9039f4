use anyhow::{Context, Result};
use chrono::Duration;
use common_auth::{ConfigError, JwtConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub jwt: JwtConfig,
    pub listen_addr: SocketAddr,
}

/// Optional JSON settings file; every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub algorithm: Option<String>,
    pub token_lifetime_in_minutes: Option<i64>,
    pub clock_skew_seconds: Option<i64>,
    pub secret_base64: Option<String>,
    pub rsa_private_key_pem: Option<String>,
    pub rsa_public_key_pem: Option<String>,
}

impl SettingsFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let vars: HashMap<String, String> = env::vars().collect();

    let file = match settings_path(&vars) {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading JWT settings file");
            SettingsFile::read(&path)?
        }
        None => SettingsFile::default(),
    };

    merge_config(file, &vars).context("Invalid auth-service configuration")
}

fn settings_path(vars: &HashMap<String, String>) -> Option<PathBuf> {
    match non_blank(vars.get("JWT_SETTINGS_FILE").map(String::as_str)) {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            fallback.exists().then_some(fallback)
        }
    }
}

/// Layers environment overrides on top of the settings file.
pub fn merge_config(
    file: SettingsFile,
    vars: &HashMap<String, String>,
) -> Result<ServiceConfig, ConfigError> {
    let var = |key: &str| non_blank(vars.get(key).map(String::as_str)).map(str::to_owned);
    let pick = |key: &str, fallback: Option<String>| {
        var(key).or_else(|| {
            fallback.and_then(|value| non_blank(Some(value.as_str())).map(str::to_owned))
        })
    };

    let issuer = pick("JWT_ISSUER", file.issuer).ok_or(ConfigError::MissingSetting("issuer"))?;
    let audience =
        pick("JWT_AUDIENCE", file.audience).ok_or(ConfigError::MissingSetting("audience"))?;

    let mut jwt = JwtConfig::new(issuer, audience);
    if let Some(algorithm) = pick("JWT_ALGORITHM", file.algorithm) {
        jwt = jwt.with_algorithm(algorithm);
    }

    let lifetime = match var("JWT_TOKEN_LIFETIME_MINUTES") {
        Some(raw) => Some(parse_number("tokenLifetimeInMinutes", &raw)?),
        None => file.token_lifetime_in_minutes,
    };
    if let Some(minutes) = lifetime {
        if minutes <= 0 {
            return Err(ConfigError::InvalidSetting(
                "tokenLifetimeInMinutes",
                minutes.to_string(),
            ));
        }
        let lifetime = Duration::try_minutes(minutes).ok_or_else(|| {
            ConfigError::InvalidSetting("tokenLifetimeInMinutes", minutes.to_string())
        })?;
        jwt = jwt.with_token_lifetime(lifetime);
    }

    let skew = match var("JWT_CLOCK_SKEW_SECONDS") {
        Some(raw) => Some(parse_number("clockSkewSeconds", &raw)?),
        None => file.clock_skew_seconds,
    };
    if let Some(seconds) = skew {
        if seconds < 0 {
            return Err(ConfigError::InvalidSetting(
                "clockSkewSeconds",
                seconds.to_string(),
            ));
        }
        let skew = Duration::try_seconds(seconds)
            .ok_or_else(|| ConfigError::InvalidSetting("clockSkewSeconds", seconds.to_string()))?;
        jwt = jwt.with_clock_skew(skew);
    }

    if let Some(secret) = pick("JWT_SECRET_BASE64", file.secret_base64) {
        jwt = jwt.with_secret_base64(secret);
    }
    if let Some(pem) = pick("JWT_RSA_PRIVATE_KEY_PEM", file.rsa_private_key_pem) {
        jwt = jwt.with_rsa_private_key_pem(pem);
    }
    if let Some(pem) = pick("JWT_RSA_PUBLIC_KEY_PEM", file.rsa_public_key_pem) {
        jwt = jwt.with_rsa_public_key_pem(pem);
    }

    let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ConfigError::InvalidSetting("HOST", host.clone()))?;
    let port = match var("PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidSetting("PORT", raw))?,
        None => DEFAULT_PORT,
    };

    Ok(ServiceConfig {
        jwt,
        listen_addr: SocketAddr::from((ip, port)),
    })
}

fn parse_number(name: &'static str, raw: &str) -> Result<i64, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidSetting(name, raw.to_string()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
