use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Which `UserRepository` backs the service.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "fake" => Ok(Self::Memory),
            other => anyhow::bail!("unknown USER_STORE value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    /// Only present when `store` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("USER_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => StoreKind::Postgres,
        };

        let database = match store {
            StoreKind::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set for the postgres store")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", 10),
                acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 5),
            }),
            StoreKind::Memory => None,
        };

        Ok(Self {
            store,
            database,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 50051),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: StoreKind::Memory,
            database: None,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_parses_known_values() {
        assert_eq!("postgres".parse::<StoreKind>().unwrap(), StoreKind::Postgres);
        assert_eq!(" Memory ".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert_eq!("fake".parse::<StoreKind>().unwrap(), StoreKind::Memory);
    }

    #[test]
    fn store_kind_rejects_unknown_values() {
        let err = "redis".parse::<StoreKind>().unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn postgres_store_names_missing_database_url() {
        std::env::set_var("USER_STORE", "postgres");
        std::env::remove_var("DATABASE_URL");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn env_or_falls_back_on_missing_value() {
        assert_eq!(env_or::<u16>("AUTH_SERVICE_TEST_UNSET_PORT", 50051), 50051);
    }

    #[test]
    fn env_or_falls_back_on_unparsable_value() {
        std::env::set_var("AUTH_SERVICE_TEST_GARBAGE_PORT", "not-a-port");
        assert_eq!(env_or::<u16>("AUTH_SERVICE_TEST_GARBAGE_PORT", 50051), 50051);

        std::env::set_var("AUTH_SERVICE_TEST_GOOD_PORT", "6000");
        assert_eq!(env_or::<u16>("AUTH_SERVICE_TEST_GOOD_PORT", 50051), 6000);
    }
}
