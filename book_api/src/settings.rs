use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::database::PostgresConfig;

const CONFIG_DIR_ENV: &str = "BOOK_API_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = "configs";
const CONFIG_FILE: &str = "main";
const ENV_PREFIX: &str = "BOOK_API";

const DEVELOPMENT_SIGNING_SECRET: &str = "development signing secret";
const DEVELOPMENT_PASSWORD_SALT: &str = "development password salt";

/// Application configuration, read once at start-up and passed explicitly to constructors
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    /// Keeps books and users in process memory instead of postgres
    #[serde(default)]
    pub use_in_memory_store: bool,
}

impl Settings {
    /// Layers `configs/main.*` (optional) and `BOOK_API__*` environment variables,
    /// e.g. `BOOK_API__DATABASE__HOST=db`
    pub fn load() -> anyhow::Result<Self> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config = config::Config::builder()
            .add_source(config::File::from(config_dir.join(CONFIG_FILE)).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to build configuration")?;

        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        config
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseSettings::default_username")]
    pub username: String,
    #[serde(default = "DatabaseSettings::default_password")]
    pub password: String,
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_ssl_mode")]
    pub ssl_mode: String,
}

impl DatabaseSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        5432
    }

    fn default_username() -> String {
        "postgres".to_string()
    }

    fn default_password() -> String {
        "postgres".to_string()
    }

    fn default_name() -> String {
        "postgres".to_string()
    }

    fn default_ssl_mode() -> String {
        "disable".to_string()
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.name.clone(),
            ssl_mode: self.ssl_mode.clone(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            username: Self::default_username(),
            password: Self::default_password(),
            name: Self::default_name(),
            ssl_mode: Self::default_ssl_mode(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_signing_secret")]
    pub signing_secret: String,
    #[serde(default = "AuthSettings::default_password_salt")]
    pub password_salt: String,
    #[serde(default = "AuthSettings::default_token_ttl_seconds")]
    pub token_ttl_seconds: i64,
}

impl AuthSettings {
    fn default_signing_secret() -> String {
        DEVELOPMENT_SIGNING_SECRET.to_string()
    }

    fn default_password_salt() -> String {
        DEVELOPMENT_PASSWORD_SALT.to_string()
    }

    fn default_token_ttl_seconds() -> i64 {
        3600
    }

    pub fn token_ttl(&self) -> anyhow::Result<chrono::Duration> {
        if self.token_ttl_seconds <= 0 {
            bail!(
                "auth.token_ttl_seconds must be positive, got {}",
                self.token_ttl_seconds
            );
        }
        chrono::Duration::try_seconds(self.token_ttl_seconds).with_context(|| {
            format!(
                "auth.token_ttl_seconds is out of range: {}",
                self.token_ttl_seconds
            )
        })
    }

    /// True when either secret was left at its built-in development value
    pub fn uses_development_secrets(&self) -> bool {
        self.signing_secret == DEVELOPMENT_SIGNING_SECRET
            || self.password_salt == DEVELOPMENT_PASSWORD_SALT
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            signing_secret: Self::default_signing_secret(),
            password_salt: Self::default_password_salt(),
            token_ttl_seconds: Self::default_token_ttl_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelemetrySettings {
    /// Export spans to a local jaeger agent
    #[serde(default)]
    pub jaeger_enabled: bool,
}

#[cfg(test)]
mod settings_tests {
    use config::{Config, File, FileFormat};

    use crate::settings::{AuthSettings, Settings};

    #[test]
    fn defaults_are_usable_for_local_runs() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.port, 5432);
        assert_eq!(settings.database.ssl_mode, "disable");
        assert_eq!(settings.auth.token_ttl().unwrap().num_seconds(), 3600);
        assert!(settings.auth.uses_development_secrets());
        assert!(!settings.use_in_memory_store);
        assert!(!settings.telemetry.jaeger_enabled);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::builder()
            .add_source(File::from_str(
                r#"
                use_in_memory_store = true

                [server]
                port = 9000

                [database]
                host = "db"
                name = "books"

                [auth]
                signing_secret = "prod secret"
                password_salt = "prod salt"
                token_ttl_seconds = 60
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings = Settings::from_config(config).expect("Failed to load settings");
        assert!(settings.use_in_memory_store);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");

        let postgres = settings.database.postgres_config();
        assert_eq!(postgres.host, "db");
        assert_eq!(postgres.database, "books");
        assert_eq!(postgres.username, "postgres");

        assert_eq!(settings.auth.token_ttl().unwrap().num_seconds(), 60);
        assert!(!settings.auth.uses_development_secrets());
    }

    #[test]
    fn non_positive_or_huge_token_ttl_is_rejected() {
        for token_ttl_seconds in [0, -60, i64::MAX] {
            let auth = AuthSettings {
                token_ttl_seconds,
                ..AuthSettings::default()
            };
            assert!(auth.token_ttl().is_err(), "{token_ttl_seconds} accepted");
        }
    }
}
