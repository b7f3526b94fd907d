//! API server config: bind address, database, logging, CORS. Loaded from env.

use anyhow::Result;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// BIND_ADDR
    pub bind_addr: String,
    /// DATABASE_URL (SQLite file path or `sqlite:` URL)
    pub database_url: String,
    /// LOG_FILE
    pub log_file: String,
    /// CORS_ALLOW_ORIGIN; any origin when unset
    pub cors_allow_origin: Option<String>,
}

impl ApiConfig {
    /// Load from environment variables. `bind` overrides BIND_ADDR if provided.
    pub fn load(bind: Option<String>) -> Result<Self> {
        let bind_addr = bind
            .or_else(|| env::var("BIND_ADDR").ok())
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./shardtalk.db".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/shardtalk.log".to_string());
        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").ok().filter(|s| !s.is_empty());

        let config = Self {
            bind_addr,
            database_url,
            log_file,
            cors_allow_origin,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("BIND_ADDR is not a valid socket address: {}", self.bind_addr);
        }
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL cannot be empty");
        }
        if let Some(ref origin) = self.cors_allow_origin {
            if origin.parse::<axum::http::HeaderValue>().is_err() {
                anyhow::bail!("CORS_ALLOW_ORIGIN is not a valid header value: {}", origin);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("BIND_ADDR");
        env::remove_var("DATABASE_URL");
        env::remove_var("LOG_FILE");
        env::remove_var("CORS_ALLOW_ORIGIN");
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();

        let config = ApiConfig::load(None).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_url, "sqlite://./shardtalk.db");
        assert_eq!(config.log_file, "logs/shardtalk.log");
        assert!(config.cors_allow_origin.is_none());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("BIND_ADDR", "127.0.0.1:8080");
        env::set_var("DATABASE_URL", "/tmp/custom.db");
        env::set_var("CORS_ALLOW_ORIGIN", "https://shardtalk.app");

        let config = ApiConfig::load(None).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.database_url, "/tmp/custom.db");
        assert_eq!(config.cors_allow_origin.as_deref(), Some("https://shardtalk.app"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_bind_override() {
        clear_env();
        env::set_var("BIND_ADDR", "127.0.0.1:8080");

        let config = ApiConfig::load(Some("127.0.0.1:9090".to_string())).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9090");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_bind_addr() {
        clear_env();
        assert!(ApiConfig::load(Some("not-an-addr".to_string())).is_err());
    }
}
