// # Settings Store Trait
//
// Defines the interface for configuration persistence.
//
// ## Purpose
//
// The engine treats settings as a fresh external read every cycle so
// configuration changes take effect without a restart. The store only
// moves bytes; fallback policy on load failure (builtin defaults on first
// run, previous in-memory settings afterwards) is owned by the engine.
//
// ## Implementations
//
// - File-based: JSON file with atomic writes (`settings::FileSettingsStore`)
// - In-memory: tests and embedding (`settings::MemorySettingsStore`)

use crate::config::Settings;
use async_trait::async_trait;

/// Trait for settings persistence implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the current settings
    ///
    /// # Returns
    ///
    /// - `Ok(Settings)`: the persisted settings
    /// - `Err(Error)`: missing or corrupt configuration; the engine decides
    ///   whether to fall back to defaults or keep the previous settings
    async fn load(&self) -> Result<Settings, crate::Error>;

    /// Persist the given settings
    ///
    /// Used at first run to write the builtin defaults and after the engine
    /// normalizes settings during a cycle (e.g. adding entries for newly
    /// seen interfaces).
    async fn save(&self, settings: &Settings) -> Result<(), crate::Error>;
}
