use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::storage::{Clock, KeyValueStore, StorageError};

/// The persisted progress blob.
///
/// ```text
/// {"stage": 5, "timestamp": 1700000000000}
/// {"stage": 24, "timestamp": 1700000000000, "completed": true}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stage: usize,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ProgressRecord {
    pub fn new(stage: usize, timestamp: u64) -> Self {
        Self {
            stage,
            timestamp,
            completed: None,
        }
    }

    /// Mark the record as a finished quest.
    pub fn completed(mut self) -> Self {
        self.completed = Some(true);
        self
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("malformed progress record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("progress record has no numeric stage")]
    InvalidStage,
}

/// What a stored record says about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stored {
    Nothing,
    Stage(usize),
    Finished,
}

/// Best-effort progress cache over a [`KeyValueStore`].
///
/// Nothing here ever fails the caller: every error is logged and turned into
/// "no progress" (stage 0) or a dropped write.
pub struct ProgressStore<S, C> {
    storage: S,
    clock: C,
    key: String,
    total_stages: usize,
}

impl<S: KeyValueStore, C: Clock> ProgressStore<S, C> {
    pub fn new(storage: S, clock: C, key: impl Into<String>, total_stages: usize) -> Self {
        Self {
            storage,
            clock,
            key: key.into(),
            total_stages,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist the current stage.
    pub fn save(&mut self, stage: usize) {
        let record = ProgressRecord::new(stage, self.clock.now_ms());
        self.persist(&record);
    }

    /// Persist the terminal record for a finished quest.
    pub fn save_completed(&mut self, stage: usize) {
        let record = ProgressRecord::new(stage, self.clock.now_ms()).completed();
        self.persist(&record);
    }

    /// Read the stored stage, clamped into `[0, total_stages - 1]`.
    ///
    /// A completed record resets to 0 and is deleted. Missing, malformed or
    /// unreadable records also yield 0.
    pub fn load(&mut self) -> usize {
        if !self.storage.is_available() {
            log::warn!("progress: storage unavailable, starting from the beginning");
            return 0;
        }

        match self.read() {
            Ok(Stored::Nothing) => 0,
            Ok(Stored::Stage(stage)) => stage,
            Ok(Stored::Finished) => {
                log::info!("progress: quest already finished, starting over");
                if let Err(e) = self.storage.remove_item(&self.key) {
                    log::debug!("progress: could not remove finished record: {}", e);
                }
                0
            }
            Err(e) => {
                log::error!("progress: failed to load: {}", e);
                0
            }
        }
    }

    /// Delete the stored record (manual restart).
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.remove_item(&self.key) {
            log::warn!("progress: could not clear record: {}", e);
        }
    }

    fn persist(&mut self, record: &ProgressRecord) {
        if !self.storage.is_available() {
            log::warn!("progress: storage unavailable, progress will not be saved");
            return;
        }

        if let Err(e) = self.write(record) {
            log::error!("progress: save failed: {}", e);
            // Quota is the usual cause: drop everything in the namespace and retry once
            let retried = self
                .storage
                .clear()
                .map_err(ProgressError::from)
                .and_then(|_| self.write(record));
            if let Err(e) = retried {
                log::error!("progress: save failed after clearing storage: {}", e);
            }
        }
    }

    fn write(&mut self, record: &ProgressRecord) -> Result<(), ProgressError> {
        let json = serde_json::to_string(record)?;
        self.storage.set_item(&self.key, &json)?;
        Ok(())
    }

    fn read(&self) -> Result<Stored, ProgressError> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(Stored::Nothing);
        };

        let value: Value = serde_json::from_str(&raw)?;
        let stage = value
            .get("stage")
            .and_then(Value::as_f64)
            .ok_or(ProgressError::InvalidStage)?;

        let completed = value
            .get("completed")
            .map(is_truthy)
            .unwrap_or(false);
        if completed {
            return Ok(Stored::Finished);
        }

        Ok(Stored::Stage(self.clamp_stage(stage)))
    }

    fn clamp_stage(&self, stage: f64) -> usize {
        let last = self.total_stages.saturating_sub(1) as f64;
        stage.clamp(0.0, last) as usize
    }
}

/// Loose truthiness, so records written by older page scripts still count.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::{FixedClock, MemoryStore};

    const KEY: &str = "footballQuest30_progress";
    const NOW: u64 = 1_700_000_000_000;

    fn store_with(storage: MemoryStore) -> ProgressStore<MemoryStore, FixedClock> {
        ProgressStore::new(storage, FixedClock(NOW), KEY, 25)
    }

    fn store_with_raw(raw: &str) -> ProgressStore<MemoryStore, FixedClock> {
        let mut storage = MemoryStore::new();
        storage.set_item(KEY, raw).unwrap();
        store_with(storage)
    }

    #[test]
    fn round_trips_every_stage() {
        let mut store = store_with(MemoryStore::new());
        for stage in 0..25 {
            store.save(stage);
            assert_eq!(store.load(), stage);
        }
    }

    #[test]
    fn fresh_session_loads_zero() {
        let mut store = store_with(MemoryStore::new());
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn saved_record_has_stage_and_timestamp() {
        let mut store = store_with(MemoryStore::new());
        store.save(5);
        let raw = store.storage().get_item(KEY).unwrap().unwrap();
        let record: ProgressRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record, ProgressRecord::new(5, NOW));
        assert!(!raw.contains("completed"));
    }

    #[test]
    fn completed_record_resets_and_is_removed() {
        let mut store = store_with(MemoryStore::new());
        store.save_completed(24);
        assert_eq!(store.load(), 0);
        assert_eq!(store.storage().get_item(KEY).unwrap(), None);
        // Next load sees nothing at all
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn out_of_range_stage_is_clamped() {
        assert_eq!(store_with_raw(r#"{"stage": 99, "timestamp": 1}"#).load(), 24);
        assert_eq!(store_with_raw(r#"{"stage": -3, "timestamp": 1}"#).load(), 0);
        assert_eq!(store_with_raw(r#"{"stage": 4.7, "timestamp": 1}"#).load(), 4);
    }

    #[test]
    fn non_numeric_stage_resets() {
        assert_eq!(store_with_raw(r#"{"stage": "five", "timestamp": 1}"#).load(), 0);
        assert_eq!(store_with_raw(r#"{"timestamp": 1}"#).load(), 0);
        assert_eq!(store_with_raw("not json").load(), 0);
    }

    #[test]
    fn unavailable_storage_loads_zero_and_save_is_silent() {
        let mut store = store_with(MemoryStore::unavailable());
        store.save(7);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn quota_clears_namespace_and_retries() {
        // Probe (21 bytes) fits next to the junk, the record (37 bytes) does not
        let mut storage = MemoryStore::with_quota(64);
        storage.set_item("junk", &"x".repeat(30)).unwrap();
        let mut store = store_with(storage);

        store.save(3);
        assert_eq!(store.storage().get_item("junk").unwrap(), None);
        assert_eq!(store.load(), 3);
    }

    #[test]
    fn store_filled_to_the_limit_is_cleared_before_saving() {
        // No room left even for the availability check
        let mut storage = MemoryStore::with_quota(64);
        storage.set_item("junk", &"x".repeat(60)).unwrap();
        let mut store = store_with(storage);

        store.save(3);
        assert_eq!(store.storage().get_item("junk").unwrap(), None);
        assert_eq!(store.load(), 3);
    }

    #[test]
    fn full_store_still_loads_saved_stage() {
        let mut storage = MemoryStore::with_quota(48);
        storage
            .set_item(KEY, r#"{"stage":6,"timestamp":1}"#)
            .unwrap();
        storage.set_item("junk", &"x".repeat(23)).unwrap();
        assert_eq!(storage.used_bytes(), 48);
        let mut store = store_with(storage);

        assert_eq!(store.load(), 6);
    }

    #[test]
    fn quota_that_never_fits_gives_up_silently() {
        let mut store = store_with(MemoryStore::with_quota(32));
        store.save(3);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn clear_deletes_record() {
        let mut store = store_with(MemoryStore::new());
        store.save(9);
        store.clear();
        assert_eq!(store.load(), 0);
    }
}
