use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::debug;

use crate::error::ThemeError;

/// Origin-scoped key-value storage for the persisted preference.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError>;
    fn remove(&self, key: &str) -> Result<(), ThemeError>;
}

/// `window.localStorage`. Looked up on every call so a storage that becomes
/// available later (or is revoked) is picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<web_sys::Storage, ThemeError> {
        let window =
            web_sys::window().ok_or_else(|| ThemeError::Storage("no window".to_string()))?;
        window
            .local_storage()
            .map_err(ThemeError::storage)?
            .ok_or_else(|| ThemeError::Storage("localStorage is not available".to_string()))
    }
}

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError> {
        self.storage()?.get_item(key).map_err(ThemeError::storage)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        debug!("localStorage set {} = {}", key, value);
        self.storage()?.set_item(key, value).map_err(ThemeError::storage)
    }

    fn remove(&self, key: &str) -> Result<(), ThemeError> {
        debug!("localStorage remove {}", key);
        self.storage()?.remove_item(key).map_err(ThemeError::storage)
    }
}

/// In-memory store for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    failing: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Make every subsequent call fail, like a browser with storage disabled.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Read a value directly, bypassing the failure switch.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn check(&self) -> Result<(), ThemeError> {
        if self.failing.get() {
            Err(ThemeError::Storage("storage is disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError> {
        self.check()?;
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        self.check()?;
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ThemeError> {
        self.check()?;
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("theme").unwrap(), None);

        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap(), Some("dark".to_string()));

        store.remove("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn test_failing_store_errors_but_keeps_values() {
        let store = MemoryStore::with_value("theme", "light");
        store.set_failing(true);

        assert!(matches!(store.get("theme"), Err(ThemeError::Storage(_))));
        assert!(store.set("theme", "dark").is_err());
        assert_eq!(store.peek("theme"), Some("light".to_string()));

        store.set_failing(false);
        assert_eq!(store.get("theme").unwrap(), Some("light".to_string()));
    }
}
