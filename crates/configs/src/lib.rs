//! # configs
//!
//! Layered runtime settings for Community Hub.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults (serde defaults below)
//! 2. an optional TOML file (`community-hub.toml`, or `$COMMUNITY_HUB_CONFIG`)
//! 3. `COMMUNITY_HUB__SECTION__KEY` environment variables (a `.env` file is
//!    loaded first)
//! 4. the plain `DATABASE_URL` and `JWT_SECRET` variables

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const ENV_PREFIX: &str = "COMMUNITY_HUB";
const DEFAULT_FILE: &str = "community-hub";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker threads; actix picks one per core when unset.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_client_request_timeout")]
    pub client_request_timeout_secs: u64,
    /// CORS origins. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            client_request_timeout_secs: default_client_request_timeout(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite://community-hub.db`.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// HMAC key for HS256 tokens.
    #[serde(deserialize_with = "secret_string")]
    pub jwt_secret: SecretString,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_client_request_timeout() -> u64 {
    5
}
fn default_max_connections() -> u32 {
    5
}
fn default_acquire_timeout() -> u64 {
    10
}
fn default_token_ttl_days() -> i64 {
    14
}
// argon2 crate defaults (OWASP minimum for argon2id)
fn default_argon2_memory_kib() -> u32 {
    19_456
}
fn default_argon2_iterations() -> u32 {
    2
}
fn default_argon2_parallelism() -> u32 {
    1
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads settings from the process environment. Missing or empty
    /// `database.url` / `auth.jwt_secret` are fatal.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("no .env file loaded: {e}");
        }

        let file = std::env::var(format!("{ENV_PREFIX}_CONFIG"))
            .unwrap_or_else(|_| DEFAULT_FILE.to_string());
        let builder = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?;

        Self::from_builder(builder)
    }

    /// Loads settings from a TOML document only.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        if self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_days <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_days must be positive".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [database]
        url = "sqlite::memory:"

        [auth]
        jwt_secret = "s3cret"
    "#;

    #[test]
    fn minimal_file_gets_defaults() {
        let settings = Settings::from_toml(MINIMAL).unwrap();
        assert_eq!(settings.bind_address(), ("127.0.0.1".to_string(), 3000));
        assert_eq!(settings.auth.token_ttl_days, 14);
        assert_eq!(settings.auth.argon2_memory_kib, 19_456);
        assert_eq!(settings.database.max_connections, 5);
        assert!(settings.server.allowed_origins.is_empty());
        assert_eq!(settings.auth.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn secret_is_not_debug_printed() {
        let settings = Settings::from_toml(MINIMAL).unwrap();
        assert!(!format!("{settings:?}").contains("s3cret"));
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = Settings::from_toml("[database]\nurl = \"sqlite::memory:\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn empty_values_are_rejected() {
        let source = "[database]\nurl = \" \"\n[auth]\njwt_secret = \"x\"\n";
        assert!(matches!(Settings::from_toml(source), Err(ConfigError::Invalid(_))));

        let source = "[database]\nurl = \"sqlite::memory:\"\n[auth]\njwt_secret = \"\"\n";
        assert!(matches!(Settings::from_toml(source), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn overrides_apply() {
        let source = r#"
            [server]
            port = 8080
            allowed_origins = ["https://example.org"]

            [database]
            url = "sqlite://hub.db"
            max_connections = 2

            [auth]
            jwt_secret = "s3cret"
            token_ttl_days = 1
        "#;
        let settings = Settings::from_toml(source).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.allowed_origins, vec!["https://example.org"]);
        assert_eq!(settings.database.max_connections, 2);
        assert_eq!(settings.auth.token_ttl_days, 1);
    }
}
