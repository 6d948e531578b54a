use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DbConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user)
            .password(&self.password)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing or unparseable
    /// values fall back to the defaults used for containerized runs.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let db = DbConfig {
            host: text("DB_HOST", "postgres"),
            port: parsed(&lookup, "DB_PORT", 5432),
            name: text("POSTGRES_DB", "chatdb"),
            user: text("POSTGRES_USER", "appuser"),
            password: text("POSTGRES_PASSWORD", "secretpassword"),
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10),
            acquire_timeout_secs: parsed(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5),
        };
        let http = HttpConfig {
            host: text("APP_HOST", "0.0.0.0"),
            port: parsed(&lookup, "APP_PORT", 8080),
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            body_limit_bytes: parsed(&lookup, "BODY_LIMIT_BYTES", 1024 * 1024),
        };
        Self { db, http }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_target_the_compose_database() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.db.host, "postgres");
        assert_eq!(cfg.db.port, 5432);
        assert_eq!(cfg.db.name, "chatdb");
        assert_eq!(cfg.db.user, "appuser");
        assert_eq!(cfg.db.password, "secretpassword");
        assert_eq!(cfg.http.host, "0.0.0.0");
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.http.body_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = config_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "6543"),
            ("POSTGRES_DB", "users"),
            ("POSTGRES_USER", "svc"),
            ("POSTGRES_PASSWORD", "pw"),
            ("APP_PORT", "3000"),
            ("REQUEST_TIMEOUT_SECS", "2"),
        ]);
        assert_eq!(cfg.db.host, "localhost");
        assert_eq!(cfg.db.port, 6543);
        assert_eq!(cfg.db.name, "users");
        assert_eq!(cfg.db.user, "svc");
        assert_eq!(cfg.db.password, "pw");
        assert_eq!(cfg.http.port, 3000);
        assert_eq!(cfg.http.request_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn from_env_always_yields_a_config() {
        let cfg: AppConfig = AppConfig::from_env();
        assert_eq!(
            cfg.http.request_timeout(),
            Duration::from_secs(cfg.http.request_timeout_secs)
        );
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let cfg = config_from(&[("DB_PORT", "not-a-port"), ("DB_MAX_CONNECTIONS", "-1")]);
        assert_eq!(cfg.db.port, 5432);
        assert_eq!(cfg.db.max_connections, 10);
    }
}
