//! Per-category visibility toggles persisted in a single storage key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `category → enabled`. Categories never toggled are enabled.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryToggles {
    entries: BTreeMap<String, bool>,
}

impl CategoryToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, category: &str) -> bool {
        self.entries.get(category).copied().unwrap_or(true)
    }

    pub fn set(&mut self, category: &str, enabled: bool) {
        self.entries.insert(category.to_string(), enabled);
    }

    /// Flips a category and returns its new state.
    pub fn toggle(&mut self, category: &str) -> bool {
        let next = !self.is_enabled(category);
        self.set(category, next);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn to_json(&self) -> Result<String, PrefsError> {
        serde_json::to_string(self).map_err(|e| PrefsError::Io(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, PrefsError> {
        serde_json::from_str(raw).map_err(|e| PrefsError::Corrupt(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefsError::StorageUnavailable => write!(f, "browser storage unavailable"),
            PrefsError::Corrupt(msg) => write!(f, "stored toggles corrupt: {msg}"),
            PrefsError::Io(msg) => write!(f, "toggle storage error: {msg}"),
        }
    }
}

impl std::error::Error for PrefsError {}

pub trait TogglesStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<CategoryToggles>, PrefsError>;
    fn save(&mut self, toggles: &CategoryToggles) -> Result<(), PrefsError>;
}

/// Reads stored toggles; anything missing or unreadable means all enabled.
pub fn load_or_default(store: &dyn TogglesStore) -> CategoryToggles {
    match store.load() {
        Ok(Some(t)) => t,
        Ok(None) => CategoryToggles::default(),
        Err(e) => {
            tracing::warn!("ignoring stored category toggles: {e}");
            CategoryToggles::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTogglesStore {
    raw: Option<String>,
}

impl InMemoryTogglesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a raw payload, as if written by an earlier run.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl TogglesStore for InMemoryTogglesStore {
    fn load(&self) -> Result<Option<CategoryToggles>, PrefsError> {
        match self.raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => CategoryToggles::from_json(raw).map(Some),
        }
    }

    fn save(&mut self, toggles: &CategoryToggles) -> Result<(), PrefsError> {
        self.raw = Some(toggles.to_json()?);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{CategoryToggles, PrefsError, TogglesStore};

    #[derive(Debug)]
    pub struct LocalStorageTogglesStore {
        key: String,
    }

    impl LocalStorageTogglesStore {
        pub fn new(key: impl Into<String>) -> Result<Self, PrefsError> {
            // Fail early if storage is disabled (private mode, sandboxed iframe).
            window_local_storage()?;
            Ok(Self { key: key.into() })
        }
    }

    impl TogglesStore for LocalStorageTogglesStore {
        fn load(&self) -> Result<Option<CategoryToggles>, PrefsError> {
            let storage = window_local_storage()?;
            let raw = storage
                .get_item(&self.key)
                .map_err(|e| PrefsError::Io(format!("get_item failed: {:?}", e)))?;
            match raw {
                Some(raw) if !raw.trim().is_empty() => CategoryToggles::from_json(&raw).map(Some),
                _ => Ok(None),
            }
        }

        fn save(&mut self, toggles: &CategoryToggles) -> Result<(), PrefsError> {
            let storage = window_local_storage()?;
            let raw = toggles.to_json()?;
            storage
                .set_item(&self.key, &raw)
                .map_err(|e| PrefsError::Io(format!("set_item failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, PrefsError> {
        let win = web_sys::window().ok_or(PrefsError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| PrefsError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(PrefsError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageTogglesStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageTogglesStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageTogglesStore {
    pub fn new(_key: impl Into<String>) -> Result<Self, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TogglesStore for LocalStorageTogglesStore {
    fn load(&self) -> Result<Option<CategoryToggles>, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn save(&mut self, _toggles: &CategoryToggles) -> Result<(), PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}
