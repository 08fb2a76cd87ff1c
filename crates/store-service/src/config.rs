//! Music store gateway configuration.
//!
//! Configuration is loaded from environment variables. All sensitive
//! fields are redacted in Debug output.

use common::jwt::{DEFAULT_CLOCK_SKEW, DEFAULT_TOKEN_LIFETIME, MAX_CLOCK_SKEW};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP port when neither `BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 5000;

/// Minimum length of the token signing secret in bytes (256 bits for HS256).
pub const MIN_TOKEN_SECRET_BYTES: usize = 32;

/// Shortest configurable access token lifetime in seconds.
pub const MIN_TOKEN_LIFETIME_SECONDS: i64 = 60;

/// Longest configurable access token lifetime in seconds (one day).
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 86_400;

/// Default payment provider API base URL.
pub const DEFAULT_PAYMENT_API_URL: &str = "https://api.stripe.com";

/// Default payment currency (ISO 4217, lowercase as the provider expects).
pub const DEFAULT_PAYMENT_CURRENCY: &str = "usd";

/// `DATABASE_URL` scheme selecting the in-process store instead of PostgreSQL.
pub const MEMORY_DATABASE_SCHEME: &str = "memory:";

/// Music store gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:5000").
    pub bind_address: String,

    /// HS256 secret used to sign and verify customer access tokens.
    pub access_token_secret: SecretString,

    /// Lifetime of issued access tokens in seconds.
    pub token_lifetime_seconds: i64,

    /// JWT clock skew tolerance in seconds for `iat` validation.
    pub jwt_clock_skew_seconds: i64,

    /// Payment provider API base URL.
    pub payment_api_url: String,

    /// Payment provider secret key.
    pub payment_secret_key: SecretString,

    /// Currency used for payment intents.
    pub payment_currency: String,

    /// Allowed CORS origins. Empty means the request origin is mirrored.
    pub cors_allowed_origins: Vec<String>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("access_token_secret", &"[REDACTED]")
            .field("token_lifetime_seconds", &self.token_lifetime_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("payment_api_url", &self.payment_api_url)
            .field("payment_secret_key", &"[REDACTED]")
            .field("payment_currency", &self.payment_currency)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid token secret: {0}")]
    InvalidTokenSecret(String),

    #[error("Invalid token lifetime configuration: {0}")]
    InvalidTokenLifetime(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid payment configuration: {0}")]
    InvalidPayment(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = match vars.get("BIND_ADDRESS") {
            Some(address) => address.clone(),
            None => {
                let port = match vars.get("PORT") {
                    Some(value) => value.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidPort(format!(
                            "PORT must be a valid port number, got '{}': {}",
                            value, e
                        ))
                    })?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };

        let access_token_secret = vars
            .get("ACCESS_TOKEN_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("ACCESS_TOKEN_SECRET".to_string()))?;
        if access_token_secret.len() < MIN_TOKEN_SECRET_BYTES {
            return Err(ConfigError::InvalidTokenSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_TOKEN_SECRET_BYTES,
                access_token_secret.len()
            )));
        }
        let access_token_secret = SecretString::from(access_token_secret.clone());

        // Safe cast: default lifetime is 3600 seconds
        #[allow(clippy::cast_possible_wrap)]
        let default_lifetime = DEFAULT_TOKEN_LIFETIME.as_secs() as i64;
        let token_lifetime_seconds = parse_bounded(
            vars,
            "TOKEN_LIFETIME_SECONDS",
            default_lifetime,
            MIN_TOKEN_LIFETIME_SECONDS,
            MAX_TOKEN_LIFETIME_SECONDS,
        )
        .map_err(ConfigError::InvalidTokenLifetime)?;

        #[allow(clippy::cast_possible_wrap)]
        let default_skew = DEFAULT_CLOCK_SKEW.as_secs() as i64;
        #[allow(clippy::cast_possible_wrap)]
        let max_skew = MAX_CLOCK_SKEW.as_secs() as i64;
        let jwt_clock_skew_seconds =
            parse_bounded(vars, "JWT_CLOCK_SKEW_SECONDS", default_skew, 0, max_skew)
                .map_err(ConfigError::InvalidJwtClockSkew)?;

        let payment_api_url = vars
            .get("PAYMENT_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PAYMENT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let payment_secret_key = vars
            .get("PAYMENT_SECRET_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("PAYMENT_SECRET_KEY".to_string()))?;
        if payment_secret_key.trim().is_empty() {
            return Err(ConfigError::InvalidPayment(
                "PAYMENT_SECRET_KEY must not be empty".to_string(),
            ));
        }
        let payment_secret_key = SecretString::from(payment_secret_key.clone());

        let payment_currency = vars
            .get("PAYMENT_CURRENCY")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PAYMENT_CURRENCY.to_string())
            .to_ascii_lowercase();
        if payment_currency.len() != 3 || !payment_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::InvalidPayment(format!(
                "PAYMENT_CURRENCY must be a 3-letter ISO code, got '{}'",
                payment_currency
            )));
        }

        let cors_allowed_origins = vars
            .get("CORS_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            database_url,
            bind_address,
            access_token_secret,
            token_lifetime_seconds,
            jwt_clock_skew_seconds,
            payment_api_url,
            payment_secret_key,
            payment_currency,
            cors_allowed_origins,
        })
    }

    /// Whether `DATABASE_URL` selects the in-process store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_SCHEME)
    }
}

/// Parse an optional integer variable and check it falls within `min..=max`.
fn parse_bounded(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, String> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: i64 = value_str.parse().map_err(|e| {
        format!(
            "{} must be a valid integer, got '{}': {}",
            name, value_str, e
        )
    })?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        ));
    }

    Ok(value)
}
