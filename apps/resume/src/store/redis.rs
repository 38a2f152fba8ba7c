use std::time::Duration;

use anyhow::{Context, Result};
use redis::Commands;

use super::SnapshotStore;

/// Upper bound for connecting and for each command round trip. Calls run
/// while the session lock is held, so an unreachable server must fail fast.
const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Keeps the snapshot as a single Redis string under a fixed key.
///
/// Opens a short-lived connection per call; the store sees one writer and a
/// handful of reads per session.
pub struct RedisStore {
    client: redis::Client,
    key: String,
}

impl RedisStore {
    pub fn open(url: &str, key: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
        Ok(RedisStore {
            client,
            key: key.into(),
        })
    }

    fn connection(&self) -> Result<redis::Connection> {
        let conn = self
            .client
            .get_connection_with_timeout(IO_TIMEOUT)
            .context("Failed to connect to Redis")?;
        conn.set_read_timeout(Some(IO_TIMEOUT))
            .context("Failed to set Redis read timeout")?;
        conn.set_write_timeout(Some(IO_TIMEOUT))
            .context("Failed to set Redis write timeout")?;
        Ok(conn)
    }
}

impl SnapshotStore for RedisStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = conn
            .get(&self.key)
            .with_context(|| format!("Redis GET {} failed", self.key))?;
        Ok(value)
    }

    fn write(&self, payload: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let _: () = conn
            .set(&self.key, payload)
            .with_context(|| format!("Redis SET {} failed", self.key))?;
        Ok(())
    }
}
