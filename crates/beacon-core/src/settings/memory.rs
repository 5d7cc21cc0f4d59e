// # Memory Settings Store
//
// In-memory implementation of SettingsStore.
//
// ## Purpose
//
// Holds settings without touching disk. Useful for tests, embedding the
// engine in another application, or deployments where configuration is
// injected at startup and never edited.
//
// ## First-run Behavior
//
// A store created with `new()` is empty: the first `load()` fails, which
// takes the engine down its first-run path (builtin defaults, persisted
// back into this store).

use crate::config::Settings;
use crate::Error;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory settings store
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<RwLock<Option<Settings>>>,
}

impl MemorySettingsStore {
    /// Create an empty store (first load fails)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with settings
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(settings))),
        }
    }

    /// Replace the stored settings
    ///
    /// The engine reloads settings every cycle, so this is how embedders
    /// and tests change configuration at runtime.
    pub async fn set(&self, settings: Settings) {
        *self.inner.write().await = Some(settings);
    }

    /// Read the stored settings, if any
    pub async fn get(&self) -> Option<Settings> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl crate::traits::SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings, Error> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::settings("no settings stored"))
    }

    async fn save(&self, settings: &Settings) -> Result<(), Error> {
        *self.inner.write().await = Some(settings.clone());
        Ok(())
    }
}
