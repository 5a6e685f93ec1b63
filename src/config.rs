/*
 * Responsibility
 * - Load settings from the environment (.env supported via dotenvy)
 * - Validate them up front so a bad deployment fails at startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A single HMAC verification key (`kid=secret`).
#[derive(Clone, PartialEq, Eq)]
pub struct HmacKey {
    pub key_id: String,
    pub secret: String,
}

impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct EdKey {
    pub key_id: String,
    pub public_key_pem: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    // bounds the whole request, key resolution included
    pub request_timeout: Duration,

    // base64("user:pass") entries; empty disables basic auth
    pub basic_auth_keys: Vec<String>,

    pub jwt_default_key_id: String,
    pub jwt_hmac_keys: Vec<HmacKey>,
    pub jwt_ed_key: Option<EdKey>,
    pub jwt_leeway_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let basic_auth_keys = split_list(&std::env::var("BASIC_AUTH_KEYS").unwrap_or_default());

        let jwt_default_key_id =
            std::env::var("JWT_DEFAULT_KEY_ID").unwrap_or_else(|_| "default".to_string());

        let jwt_hmac_keys = parse_hmac_keys(&std::env::var("JWT_HMAC_KEYS").unwrap_or_default())?;

        let jwt_ed_key = match std::env::var("JWT_ED_PUBLIC_KEY_PEM") {
            Ok(pem) if !pem.trim().is_empty() => Some(EdKey {
                key_id: std::env::var("JWT_ED_KEY_ID")
                    .unwrap_or_else(|_| jwt_default_key_id.clone()),
                public_key_pem: pem.replace("\\n", "\n"),
            }),
            _ => None,
        };

        let jwt_leeway_seconds = match std::env::var("JWT_LEEWAY_SECONDS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            Err(_) => 60,
        };

        let config = Self {
            addr,
            app_env,
            request_timeout,
            basic_auth_keys,
            jwt_default_key_id,
            jwt_hmac_keys,
            jwt_ed_key,
            jwt_leeway_seconds,
        };

        // Serving with no scheme would reject every request
        if config.basic_auth_keys.is_empty() && !config.bearer_enabled() {
            return Err(ConfigError::Missing(
                "BASIC_AUTH_KEYS or JWT_HMAC_KEYS or JWT_ED_PUBLIC_KEY_PEM",
            ));
        }

        Ok(config)
    }

    pub fn bearer_enabled(&self) -> bool {
        !self.jwt_hmac_keys.is_empty() || self.jwt_ed_key.is_some()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// "kid1=secret1,kid2=secret2"
fn parse_hmac_keys(raw: &str) -> Result<Vec<HmacKey>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|entry| -> Result<HmacKey, ConfigError> {
            let (key_id, secret) = entry
                .split_once('=')
                .filter(|(k, s)| !k.is_empty() && !s.is_empty())
                .ok_or(ConfigError::Invalid("JWT_HMAC_KEYS"))?;
            Ok(HmacKey {
                key_id: key_id.to_string(),
                secret: secret.to_string(),
            })
        })
        .collect()
}
