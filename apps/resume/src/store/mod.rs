//! Single-slot persistence for the résumé.
//!
//! `SnapshotStore` is the swappable key-value backend (memory, file, Redis).
//! `ResumeRepository` layers the load/save contract on top of it: a snapshot
//! that cannot be read or parsed degrades to "nothing saved yet", and every
//! save stamps `updatedAt` while keeping the first `createdAt`.

pub mod file;
pub mod memory;
pub mod redis;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::resume::ResumeData;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Default key of the single stored record.
pub const DEFAULT_STORE_KEY: &str = "resume-data";

/// A key-value backend holding at most one serialized snapshot.
///
/// Calls are synchronous: every backend is local to the client session.
pub trait SnapshotStore: Send + Sync {
    /// The fixed key the snapshot lives under.
    fn key(&self) -> &str;

    /// Returns the raw snapshot, or `None` when nothing was ever written.
    fn read(&self) -> Result<Option<String>>;

    /// Replaces the snapshot.
    fn write(&self, payload: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct ResumeRepository {
    store: Arc<dyn SnapshotStore>,
}

impl ResumeRepository {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        ResumeRepository { store }
    }

    /// Reads the stored résumé. Never fails: unreadable or corrupt state is
    /// logged and reported as absent so the caller starts fresh.
    pub fn load(&self) -> Option<ResumeData> {
        let raw = match self.store.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = self.store.key(), "No stored resume snapshot");
                return None;
            }
            Err(e) => {
                warn!(key = self.store.key(), "Resume snapshot unreadable, starting fresh: {e:#}");
                return None;
            }
        };

        match serde_json::from_str::<ResumeData>(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key = self.store.key(), "Resume snapshot corrupt, starting fresh: {e}");
                None
            }
        }
    }

    /// Writes `data` as the new snapshot and returns its `updated_at`.
    ///
    /// Stamps `data` in place so the caller's copy matches what was stored:
    /// `updated_at` is always now; `created_at` is taken from the previous
    /// record when one exists, otherwise it is set to the same instant.
    pub fn save(&self, data: &mut ResumeData) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        data.created_at = match self.load() {
            Some(existing) => existing.created_at,
            None => now,
        };
        data.updated_at = now;

        let payload = serde_json::to_string(data).context("Failed to serialize resume snapshot")?;
        self.store
            .write(&payload)
            .with_context(|| format!("Failed to write resume snapshot '{}'", self.store.key()))?;

        info!(
            key = self.store.key(),
            bytes = payload.len(),
            updated_at = %now,
            "Resume snapshot saved"
        );
        Ok(now)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationEntry, EntryId};

    fn repo() -> (Arc<MemoryStore>, ResumeRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = ResumeRepository::new(store.clone());
        (store, repo)
    }

    #[test]
    fn test_load_absent_when_nothing_saved() {
        let (_, repo) = repo();
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_, repo) = repo();
        let mut data = ResumeData::empty();
        data.personal_info.name = "山田太郎".to_string();
        data.education
            .push(EducationEntry::new(EntryId::from("e1")));
        let before = data.updated_at;

        let stamped = repo.save(&mut data).unwrap();
        let loaded = repo.load().unwrap();

        assert_eq!(loaded, data);
        assert_eq!(loaded.updated_at, stamped);
        assert!(loaded.updated_at >= before);
    }

    #[test]
    fn test_first_save_sets_both_timestamps() {
        let (_, repo) = repo();
        let mut data = ResumeData::empty();
        let stamped = repo.save(&mut data).unwrap();
        assert_eq!(data.created_at, stamped);
        assert_eq!(data.updated_at, stamped);
    }

    #[test]
    fn test_later_save_preserves_created_at() {
        let (_, repo) = repo();
        let mut data = ResumeData::empty();
        repo.save(&mut data).unwrap();
        let created = data.created_at;

        let mut next = ResumeData::empty();
        next.motivation = "更新".to_string();
        let second = repo.save(&mut next).unwrap();

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.created_at, created);
        assert_eq!(loaded.updated_at, second);
        assert!(second >= created);
        assert_eq!(loaded.motivation, "更新");
    }

    #[test]
    fn test_corrupt_snapshot_degrades_to_absent() {
        let (store, repo) = repo();
        store.write("{not json").unwrap();
        assert!(repo.load().is_none());

        store.write(r#"{"personalInfo": 42}"#).unwrap();
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_save_over_corrupt_snapshot_succeeds() {
        let (store, repo) = repo();
        store.write("garbage").unwrap();
        let mut data = ResumeData::empty();
        let stamped = repo.save(&mut data).unwrap();
        assert_eq!(data.created_at, stamped);
        assert!(repo.load().is_some());
    }

    #[test]
    fn test_load_is_idempotent() {
        let (_, repo) = repo();
        let mut data = ResumeData::empty();
        data.self_pr = "粘り強さ".to_string();
        repo.save(&mut data).unwrap();
        assert_eq!(repo.load(), repo.load());
    }

    #[test]
    fn test_single_slot_overwrites() {
        let (store, repo) = repo();
        let mut first = ResumeData::empty();
        first.personal_info.name = "一人目".to_string();
        repo.save(&mut first).unwrap();
        let mut second = ResumeData::empty();
        second.personal_info.name = "二人目".to_string();
        repo.save(&mut second).unwrap();

        assert_eq!(store.write_count(), 2);
        assert_eq!(repo.load().unwrap().personal_info.name, "二人目");
    }
}
