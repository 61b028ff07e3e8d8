//! Configuration management

use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS, DEFAULT_REALTIME_QUEUE_CAPACITY,
    DEFAULT_REFRESH_TOKEN_EXPIRY, DEFAULT_REQUEST_TTL_DAYS, DEFAULT_UPCOMING_LIMIT,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub mail: MailSettings,
    pub booking: BookingSettings,
    pub realtime: RealtimeSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub driver: DatabaseDriver,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    Smtp,
    Log,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub transport: MailTransport,
    pub from: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingSettings {
    pub request_ttl_days: i64,
    pub expiry_sweep_interval_secs: u64,
    pub upcoming_default_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub json: bool,
    pub directory: Option<String>,
}

/// Prefix of environment overrides: `APP__JWT__SECRET` sets `jwt.secret`.
pub const ENV_PREFIX: &str = "APP";

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_env(None)
    }

    /// `env_vars` replaces the process environment when given.
    pub fn load_with_env(env_vars: Option<Map<String, String>>) -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "inkbook-server")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.driver", "postgres")?
            .set_default("database.url", "postgres://localhost/inkbook")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("jwt.refresh_token_expiry", DEFAULT_REFRESH_TOKEN_EXPIRY)?
            .set_default("mail.transport", "log")?
            .set_default("mail.from", "noreply@inkbook.local")?
            .set_default("mail.smtp_host", "localhost")?
            .set_default("mail.smtp_port", 1025)?
            .set_default("mail.smtp_tls", false)?
            .set_default("booking.request_ttl_days", DEFAULT_REQUEST_TTL_DAYS)?
            .set_default("booking.expiry_sweep_interval_secs", DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS)?
            .set_default("booking.upcoming_default_limit", DEFAULT_UPCOMING_LIMIT)?
            .set_default("realtime.queue_capacity", DEFAULT_REALTIME_QUEUE_CAPACITY as u64)?
            .set_default("log.json", true)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::InvalidConfig("jwt.secret must not be empty".into()));
        }
        if self.booking.request_ttl_days <= 0 {
            return Err(AppError::InvalidConfig("booking.request_ttl_days must be positive".into()));
        }
        if self.booking.expiry_sweep_interval_secs == 0 {
            return Err(AppError::InvalidConfig(
                "booking.expiry_sweep_interval_secs must be positive".into(),
            ));
        }
        if self.realtime.queue_capacity == 0 {
            return Err(AppError::InvalidConfig("realtime.queue_capacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            app: AppSettings {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 8080,
                name: "inkbook-server".into(),
                cors_origins: vec![],
            },
            database: DatabaseSettings {
                driver: DatabaseDriver::Memory,
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
                run_migrations: false,
            },
            jwt: JwtSettings {
                secret: "secret".into(),
                access_token_expiry: 60,
                refresh_token_expiry: 120,
            },
            mail: MailSettings {
                transport: MailTransport::Log,
                from: "noreply@inkbook.local".into(),
                smtp_host: "localhost".into(),
                smtp_port: 1025,
                smtp_username: None,
                smtp_password: None,
                smtp_tls: false,
            },
            booking: BookingSettings {
                request_ttl_days: 7,
                expiry_sweep_interval_secs: 60,
                upcoming_default_limit: 10,
            },
            realtime: RealtimeSettings { queue_capacity: 16 },
            log: LogSettings { json: false, directory: None },
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = sample();
        config.jwt.secret = "  ".into();
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_only_prefixed_variables_override() {
        let mut vars = Map::new();
        vars.insert("APP__JWT__SECRET".to_string(), "from-env".to_string());
        vars.insert("APP__DATABASE__DRIVER".to_string(), "memory".to_string());
        vars.insert("APP__BOOKING__REQUEST_TTL_DAYS".to_string(), "3".to_string());
        vars.insert("DATABASE__URL".to_string(), "postgres://unrelated/db".to_string());
        vars.insert("PATH".to_string(), "/usr/bin".to_string());

        let config = AppConfig::load_with_env(Some(vars)).unwrap();
        assert_eq!(config.jwt.secret, "from-env");
        assert_eq!(config.database.driver, DatabaseDriver::Memory);
        assert_eq!(config.booking.request_ttl_days, 3);
        assert_ne!(config.database.url, "postgres://unrelated/db");
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = sample();
        config.booking.request_ttl_days = 0;
        assert!(config.validate().is_err());
    }
}
