//! Application configuration.
//!
//! Settings come from `gearguard.toml` (see [`crate::db::find_config_file`])
//! and are then overridden by environment variables:
//!
//! - `HOST`, `PORT`: bind address
//! - `JWT_SECRET`: token signing secret
//! - `ADMIN_SECRET_KEY`: secret required to register admin accounts
//! - `REPOSITORY_TYPE`: `local` or `postgres`
//! - `DATABASE_URL` / `PG_DATABASE_URL`: Postgres URL (implies `postgres`
//!   unless `REPOSITORY_TYPE` says otherwise)
//! - `PG_POOL_MAX`, `PG_POOL_MIN`: pool bounds
//!
//! With no file and no variables the server runs on the in-memory
//! repository on port 8080.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::TokenService;
use crate::db::{find_config_file, RepositoryConfig};

/// Signing secret used when none is configured; fine for local runs only.
pub const DEV_JWT_SECRET: &str = "gearguard-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Admin registration is refused while this is unset.
    #[serde(default)]
    pub admin_secret_key: Option<String>,
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_days: i64,
    /// Adds `Secure` to the refresh cookie.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_access_minutes() -> i64 {
    30
}

fn default_refresh_days() -> i64 {
    7
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            admin_secret_key: None,
            access_token_minutes: default_access_minutes(),
            refresh_token_days: default_refresh_days(),
            secure_cookies: false,
        }
    }
}

/// Upper bounds on token lifetimes: one year of access, ten of refresh.
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 60 * 24 * 365;
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 3650;

fn lifetime(value: i64, max: i64, to_duration: fn(i64) -> Option<Duration>) -> Option<Duration> {
    if (1..=max).contains(&value) {
        to_duration(value)
    } else {
        None
    }
}

impl AuthSettings {
    fn access_ttl(&self) -> Option<Duration> {
        lifetime(self.access_token_minutes, MAX_ACCESS_TOKEN_MINUTES, Duration::try_minutes)
    }

    fn refresh_ttl(&self) -> Option<Duration> {
        lifetime(self.refresh_token_days, MAX_REFRESH_TOKEN_DAYS, Duration::try_days)
    }

    /// Reject token lifetimes that are not positive or exceed the caps.
    pub fn validate(&self) -> Result<()> {
        if self.access_ttl().is_none() {
            bail!(
                "access_token_minutes must be between 1 and {}, got {}",
                MAX_ACCESS_TOKEN_MINUTES,
                self.access_token_minutes
            );
        }
        if self.refresh_ttl().is_none() {
            bail!(
                "refresh_token_days must be between 1 and {}, got {}",
                MAX_REFRESH_TOKEN_DAYS,
                self.refresh_token_days
            );
        }
        Ok(())
    }

    /// Token service for these settings. Out-of-range lifetimes fall back to
    /// the defaults; [`AuthSettings::validate`] rejects them at load time.
    pub fn token_service(&self) -> TokenService {
        TokenService::new(
            &self.jwt_secret,
            self.access_ttl()
                .unwrap_or_else(|| Duration::minutes(default_access_minutes())),
            self.refresh_ttl()
                .unwrap_or_else(|| Duration::days(default_refresh_days())),
        )
    }
}

/// Everything in `gearguard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(flatten)]
    pub store: RepositoryConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.auth.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// File from the default location (or defaults), then the environment.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.auth.validate()?;
        if config.auth.jwt_secret == DEV_JWT_SECRET {
            log::warn!("JWT_SECRET not configured; using the development secret");
        }
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(secret) = lookup("ADMIN_SECRET_KEY") {
            self.auth.admin_secret_key = Some(secret);
        }

        let url = lookup("DATABASE_URL").or_else(|| lookup("PG_DATABASE_URL"));
        if let Some(url) = url {
            self.store.postgres.database_url = url;
            self.store.repository.repo_type = "postgres".to_string();
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.store.repository.repo_type = repo_type;
        }
        if let Some(max) = lookup("PG_POOL_MAX").and_then(|v| v.parse().ok()) {
            self.store.postgres.max_connections = max;
        }
        if let Some(min) = lookup("PG_POOL_MIN").and_then(|v| v.parse().ok()) {
            self.store.postgres.min_connections = min;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryType;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_token_minutes, 30);
        assert_eq!(config.auth.refresh_token_days, 7);
        assert!(config.auth.admin_secret_key.is_none());
        assert_eq!(config.store.repository_type().unwrap(), RepositoryType::Local);
    }

    #[test]
    fn test_parse_all_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[auth]
jwt_secret = "file-secret"
admin_secret_key = "let-me-in"
access_token_minutes = 5

[repository]
type = "local"
"#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.auth.admin_secret_key.as_deref(), Some("let-me-in"));
        assert_eq!(config.auth.access_token_minutes, 5);
        assert_eq!(config.auth.refresh_token_days, 7);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut config = AppConfig::from_toml_str("[server]\nport = 9000\n").unwrap();
        config
            .apply_overrides(lookup(&[
                ("PORT", "7000"),
                ("JWT_SECRET", "env-secret"),
                ("ADMIN_SECRET_KEY", "admin"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert_eq!(config.auth.admin_secret_key.as_deref(), Some("admin"));
    }

    #[test]
    fn test_database_url_selects_postgres_unless_type_given() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[("DATABASE_URL", "postgres://u@h/db")]))
            .unwrap();
        assert_eq!(
            config.store.repository_type().unwrap(),
            RepositoryType::Postgres
        );
        assert_eq!(config.store.postgres.database_url, "postgres://u@h/db");

        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("DATABASE_URL", "postgres://u@h/db"),
                ("REPOSITORY_TYPE", "local"),
            ]))
            .unwrap();
        assert_eq!(config.store.repository_type().unwrap(), RepositoryType::Local);
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let mut config = AppConfig::default();
        assert!(config.apply_overrides(lookup(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gearguard.toml");
        std::fs::write(&path, "[auth]\nrefresh_token_days = 1\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.auth.refresh_token_days, 1);
    }

    #[test]
    fn test_token_lifetimes_out_of_range_are_rejected() {
        for toml in [
            "[auth]\naccess_token_minutes = 0\n",
            "[auth]\naccess_token_minutes = 9223372036854775807\n",
            "[auth]\nrefresh_token_days = -1\n",
            "[auth]\nrefresh_token_days = 9223372036854775807\n",
        ] {
            let err = AppConfig::from_toml_str(toml).unwrap_err();
            assert!(err.to_string().contains("must be between 1 and"), "{}", err);
        }
    }

    #[test]
    fn test_token_service_survives_unvalidated_lifetimes() {
        let auth = AuthSettings {
            access_token_minutes: i64::MAX,
            refresh_token_days: i64::MAX,
            ..AuthSettings::default()
        };
        assert!(auth.validate().is_err());
        let tokens = auth.token_service();
        assert_eq!(tokens.refresh_ttl(), Duration::days(7));
    }
}
