// src/config.rs
use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct DigiflazzConfig {
    pub username: String,
    pub api_key: String,
    pub base_url: String,
}

/// Everything the service reads from the environment, loaded once at startup
/// and handed to handlers through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    /// Prefix for locally stored uploads, e.g. `http://localhost:3000/storage`.
    pub storage_url: String,
    /// Role whose profit percentage prices anonymous viewers.
    pub guest_role_name: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub digiflazz: Option<DigiflazzConfig>,
    pub db_max_connections: u32,
}

pub const DEFAULT_DIGIFLAZZ_URL: &str = "https://api.digiflazz.com/v1";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let digiflazz = match (optional("DIGIFLAZZ_USERNAME"), optional("DIGIFLAZZ_API_KEY")) {
            (Some(username), Some(api_key)) => Some(DigiflazzConfig {
                username,
                api_key,
                base_url: optional("DIGIFLAZZ_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DIGIFLAZZ_URL.to_string()),
            }),
            _ => {
                info!("Digiflazz credentials not set, provider sync disabled");
                None
            }
        };

        Ok(Self {
            database_url,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3000")?,
            jwt_secret,
            storage_url: try_load::<String>("STORAGE_URL", "/storage")?
                .trim_end_matches('/')
                .to_string(),
            guest_role_name: try_load("GUEST_ROLE_NAME", "guest")?,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
            digiflazz,
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "10")?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid { key, reason: e.to_string() }
        })
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/topup_test".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            jwt_secret: "test-secret".to_string(),
            storage_url: "http://localhost:3000/storage".to_string(),
            guest_role_name: "guest".to_string(),
            admin_username: None,
            admin_password: None,
            digiflazz: None,
            db_max_connections: 1,
        }
    }
}
