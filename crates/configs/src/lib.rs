//! # configs
//!
//! Layered settings for the Pressroom binaries.
//!
//! Precedence, lowest first: built-in defaults, `config/default.toml`,
//! `config/<PRESSROOM_ENV>.toml`, then `PRESSROOM__SECTION__KEY` environment
//! variables. A `.env` file is read into the environment before anything else.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "PRESSROOM";
pub const ENV_SELECTOR: &str = "PRESSROOM_ENV";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub features: FeatureSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(deserialize_with = "secret_string")]
    pub jwt_secret: SecretString,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureSettings {
    pub claps_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Reads `.env`, every layer and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".into());
        let config = Self::layered(&env)?.build()?;
        Self::from_config(config)
    }

    /// Defaults plus the file and environment layers, not yet built.
    pub fn layered(env: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// Built-in defaults. `auth.jwt_secret` has none and must be supplied.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://pressroom.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_ttl_secs", 86_400)?
            .set_default("features.claps_enabled", true)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "auth.jwt_secret",
                message: "must not be empty".into(),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database.url",
                message: "must not be empty".into(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "database.max_connections",
                message: "must be at least 1".into(),
            });
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "auth.token_ttl_secs",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
