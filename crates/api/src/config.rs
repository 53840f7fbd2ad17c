//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const BIND_ADDR_ENV: &str = "MEDRX_BIND_ADDR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "MEDRX_TOKEN_TTL_MINUTES";
pub const SEED_CATALOG_ENV: &str = "MEDRX_SEED_CATALOG";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TTL_MINUTES: i64 = 60;
const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub seed_catalog: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup(BIND_ADDR_ENV)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: BIND_ADDR_ENV,
                reason: e.to_string(),
            })?;

        let jwt_secret = match lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
        };

        let ttl_minutes = match lookup(TOKEN_TTL_ENV) {
            None => DEFAULT_TTL_MINUTES,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(m) if m > 0 => m,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: TOKEN_TTL_ENV,
                        reason: format!("expected a positive number of minutes, got '{raw}'"),
                    });
                }
            },
        };

        let seed_catalog = match lookup(SEED_CATALOG_ENV) {
            None => false,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| ConfigError::Invalid {
                name: SEED_CATALOG_ENV,
                reason: format!("expected true or false, got '{raw}'"),
            })?,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
            seed_catalog,
        })
    }

    /// Defaults with an explicit signing secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: secret.into(),
            token_ttl: chrono::Duration::minutes(DEFAULT_TTL_MINUTES),
            seed_catalog: false,
        }
    }
}
