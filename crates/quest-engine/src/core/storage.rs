use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by a key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backend cannot be used at all (private mode, disabled, no window).
    #[error("storage is unavailable")]
    Unavailable,
    /// A write did not fit into the remaining quota.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// Any other backend failure, with the backend's own description.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Key used to probe whether a backend accepts writes.
pub const PROBE_KEY: &str = "__localStorage_test__";

/// String key-value storage with the shape of the browser `Storage` API.
///
/// The web crate implements this over `window.localStorage`; [`MemoryStore`]
/// backs tests and headless runs.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    /// Remove every key in the namespace.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Write and remove a probe key, reporting why the backend refused.
    fn probe(&mut self) -> Result<(), StorageError> {
        self.set_item(PROBE_KEY, PROBE_KEY)?;
        self.remove_item(PROBE_KEY)
    }

    /// Whether the backend can be used at all. A full store still counts:
    /// it can be read, and cleared to make room.
    fn is_available(&mut self) -> bool {
        !matches!(
            self.probe(),
            Err(StorageError::Unavailable | StorageError::Backend(_))
        )
    }
}

/// Source of wall-clock timestamps for progress records.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Host clock backed by `SystemTime`. Not usable on `wasm32-unknown-unknown`;
/// the web crate supplies a `Date.now()` clock instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

/// In-memory backend with an optional byte quota.
///
/// The quota counts value bytes only, like a browser counting stored strings.
/// A write that would push the total above the quota fails with
/// [`StorageError::QuotaExceeded`] and leaves the store untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `bytes` of stored values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Create a store that fails every operation with `Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Total bytes of stored values.
    pub fn used_bytes(&self) -> usize {
        self.items.values().map(String::len).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(quota) = self.quota {
            let replaced = self.items.get(key).map_or(0, String::len);
            if self.used_bytes() - replaced + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.check_available()?;
        self.items.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        store.set_item("a", "1").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));
        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let mut store = MemoryStore::with_quota(8);
        store.set_item("a", "12345").unwrap();
        assert_eq!(store.set_item("b", "12345"), Err(StorageError::QuotaExceeded));
        // Overwriting an existing key only counts the difference
        store.set_item("a", "12345678").unwrap();
        assert_eq!(store.used_bytes(), 8);
    }

    #[test]
    fn probe_leaves_no_trace() {
        let mut store = MemoryStore::new();
        assert!(store.is_available());
        assert!(store.is_empty());
    }

    #[test]
    fn full_store_is_still_available() {
        let mut store = MemoryStore::with_quota(4);
        store.set_item("a", "1234").unwrap();
        assert_eq!(store.probe(), Err(StorageError::QuotaExceeded));
        assert!(store.is_available());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unavailable_store_fails_probe() {
        let mut store = MemoryStore::unavailable();
        assert_eq!(store.probe(), Err(StorageError::Unavailable));
        assert!(!store.is_available());
        assert_eq!(store.get_item("x"), Err(StorageError::Unavailable));
    }
}
