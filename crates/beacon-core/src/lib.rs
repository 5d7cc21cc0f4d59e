// # beacon-core
//
// Core library for the beacon mDNS advertisement system.
//
// ## Architecture Overview
//
// This library keeps mDNS advertisements converged with a live-reloadable
// configuration and the host's changing network topology:
//
// - **InterfaceSource**: Trait for enumerating active network interfaces
// - **SettingsStore**: Trait for configuration persistence
// - **AdvertisementBackend**: Trait for the mDNS registration machinery
// - **planner**: Derives the desired runner map from interfaces + settings
// - **RunnerRegistry**: Owns the live runner map and reconciles it
// - **BeaconEngine**: Drives plan → reconcile cycles and the shutdown drain
//
// ## Design Principles
//
// 1. **Reconciliation over bookkeeping**: every cycle replans from scratch
//    and diffs against the live map; failures self-heal on the next cycle
// 2. **Idempotence**: an unchanged desired map issues zero backend calls
// 3. **Separation of Concerns**: collaborators sit behind traits, the
//    engine owns all scheduling and retry-by-replanning decisions
// 4. **Library-First**: the daemon binary is a thin wiring layer

pub mod announce;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod registry;
pub mod settings;
pub mod traits;

// Re-export core types for convenience
pub use announce::{Announcement, Runner, RunnerSnapshot, ServiceEntry};
pub use catalog::{ServiceCatalog, ServiceProtocol, ServiceTemplate};
pub use config::{EngineConfig, Settings};
pub use engine::{BeaconEngine, EngineEvent};
pub use error::{Error, Result};
pub use registry::{ReconcileSummary, RunnerRegistry};
pub use settings::{FileSettingsStore, MemorySettingsStore};
pub use traits::{AdvertisementBackend, AdvertisementHandle, InterfaceSource, SettingsStore};
