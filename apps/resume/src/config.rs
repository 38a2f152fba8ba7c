use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::store::DEFAULT_STORE_KEY;

/// Which backend holds the single résumé snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Memory,
    Redis,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            "redis" => Ok(StoreKind::Redis),
            other => bail!("RESUME_STORE must be one of file, memory, redis (got '{other}')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a value is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub rust_log: String,
    pub store: StoreKind,
    pub store_path: PathBuf,
    pub store_key: String,
    /// Only read when `store` is `Redis`.
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store = lookup("RESUME_STORE")
            .map(|value| value.parse::<StoreKind>())
            .transpose()?
            .unwrap_or(StoreKind::File);

        let redis_url = lookup("REDIS_URL");
        if store == StoreKind::Redis && redis_url.is_none() {
            bail!("Required environment variable 'REDIS_URL' is not set (RESUME_STORE=redis)");
        }

        Ok(Config {
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1".to_string())
                .parse::<IpAddr>()
                .context("BIND_ADDR must be an IP address")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            store,
            store_path: lookup("RESUME_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/resume-data.json")),
            store_key: lookup("RESUME_STORE_KEY").unwrap_or_else(|| DEFAULT_STORE_KEY.to_string()),
            redis_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1");
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.store_path, PathBuf::from("data/resume-data.json"));
        assert_eq!(config.store_key, "resume-data");
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_store_kind_parsing() {
        assert_eq!("Memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!("postgres".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_redis_requires_url() {
        assert!(config(&[("RESUME_STORE", "redis")]).is_err());
        let config = config(&[
            ("RESUME_STORE", "redis"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Redis);
    }

    #[test]
    fn test_malformed_port_fails() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
