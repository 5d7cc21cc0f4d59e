// # File Settings Store
//
// File-based implementation of SettingsStore.
//
// ## Purpose
//
// Persists settings as a JSON file that users edit by hand; the engine
// reloads it every cycle, so edits take effect without a restart.
//
// ## Write Discipline
//
// - Atomic writes: new settings are written to a temporary file in the
//   same directory, then renamed over the target
// - Parent directories are created on demand
// - A missing or corrupt file surfaces an error from `load()`; the
//   fallback policy (builtin defaults on first run, previous in-memory
//   settings afterwards) is owned by the engine
//
// ## File Format
//
// ```json
// {
//   "blacklist": ["lo", "docker", "veth"],
//   "default": { "domain_names": ["beacon"], "advertise": ["http"] },
//   "interfaces": [
//     { "name": "eth0", "domain_names": [], "advertise": [] }
//   ],
//   "services": [
//     { "name": "http", "protocol": "tcp", "port": 80, "properties": {} }
//   ]
// }
// ```

use crate::config::Settings;
use crate::Error;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-based settings store with atomic writes
///
/// # Example
///
/// ```rust,no_run
/// use beacon_core::settings::FileSettingsStore;
/// use beacon_core::traits::SettingsStore;
/// use beacon_core::config::Settings;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSettingsStore::new("/var/lib/beacon/settings.json");
///     store.save(&Settings::builtin()).await?;
///     let settings = store.load().await?;
///     assert!(!settings.default.domain_names.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Create a store backed by the given path
    ///
    /// The file does not need to exist yet; the first failed `load()`
    /// makes the engine persist builtin defaults here.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::settings(format!(
                        "Failed to create settings directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl crate::traits::SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Settings, Error> {
        let contents = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::settings(format!(
                "Failed to read settings file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            Error::settings(format!(
                "Settings file {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!(
            "Loaded settings from {}: {} interface override(s), {} service(s)",
            self.path.display(),
            settings.interfaces.len(),
            settings.services.len()
        );
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), Error> {
        self.ensure_parent().await?;

        let json = serde_json::to_string_pretty(settings)?;

        // Write-then-rename keeps a concurrent reader (or a crash) from
        // ever seeing a half-written file.
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
            Error::settings(format!(
                "Failed to create {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        file.write_all(json.as_bytes()).await.map_err(|e| {
            Error::settings(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            Error::settings(format!("Failed to sync {}: {}", tmp_path.display(), e))
        })?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            Error::settings(format!(
                "Failed to rename {} to {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
