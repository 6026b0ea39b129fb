use quest_engine::{Clock, KeyValueStore, StorageError};
use wasm_bindgen::{JsCast, JsValue};

/// `window.localStorage`, or nothing when the page has no usable storage
/// (private mode, sandboxed iframe, disabled cookies).
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn from_window() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            log::warn!("localStorage is not available; progress will not persist");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StorageError> {
        self.inner.as_ref().ok_or(StorageError::Unavailable)
    }
}

/// Browsers report a full store as a `DOMException` named
/// `QuotaExceededError` (legacy code 22).
fn storage_error(err: JsValue) -> StorageError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(e) if e.name() == "QuotaExceededError" || e.code() == 22 => StorageError::QuotaExceeded,
        Some(e) => StorageError::Backend(format!("{}: {}", e.name(), e.message())),
        None => StorageError::Backend(format!("{:?}", err)),
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(storage_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(storage_error)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage()?.remove_item(key).map_err(storage_error)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.storage()?.clear().map_err(storage_error)
    }
}

/// Wall clock from `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}
