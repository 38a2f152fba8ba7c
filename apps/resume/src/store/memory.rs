use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::{SnapshotStore, DEFAULT_STORE_KEY};

/// In-process slot. Used by tests and by `RESUME_STORE=memory`.
pub struct MemoryStore {
    key: String,
    slot: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            key: DEFAULT_STORE_KEY.to_string(),
            slot: Mutex::new(None),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful `write` calls since construction.
    #[cfg(test)]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for MemoryStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(slot.clone())
    }

    fn write(&self, payload: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        *slot = Some(payload.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
