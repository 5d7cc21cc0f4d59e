//! Core reconciliation engine
//!
//! The BeaconEngine is responsible for:
//! - Reloading settings and the service catalog every cycle
//! - Re-enumerating active interfaces via InterfaceSource
//! - Planning the desired runner map
//! - Converging the live registry to it via AdvertisementBackend
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌───────────────┐
//! │ SettingsStore   │   │InterfaceSource│
//! └────────┬────────┘   └───────┬───────┘
//!          │    settings        │ interfaces
//!          ▼                    ▼
//!        ┌──────────────────────────┐
//!        │       BeaconEngine       │── EngineEvent ──▶ (monitoring)
//!        └────────────┬─────────────┘
//!                     │ desired runner map
//!                     ▼
//!        ┌──────────────────────────┐
//!        │      RunnerRegistry      │
//!        └────────────┬─────────────┘
//!                     │ register / unregister
//!                     ▼
//!        ┌──────────────────────────┐
//!        │   AdvertisementBackend   │
//!        └──────────────────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Reload settings (failure keeps the previous in-memory settings)
//! 2. Rebuild the service catalog
//! 3. Enumerate interfaces (failure skips the cycle)
//! 4. Plan desired runners
//! 5. Reconcile the live registry (fan-out, join)
//! 6. Persist any settings normalization
//! 7. Sleep the configured interval, unless shutdown interrupts it
//!
//! Cycles never overlap: the loop sleeps only after every register and
//! unregister call of the cycle has resolved.

use crate::catalog::ServiceCatalog;
use crate::config::{EngineConfig, Settings};
use crate::error::Result;
use crate::planner;
use crate::registry::RunnerRegistry;
use crate::traits::{AdvertisementBackend, InterfaceSource, SettingsStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the BeaconEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        interval_secs: u64,
    },

    /// Settings could not be reloaded; previous settings stay in effect
    SettingsReloadFailed {
        error: String,
    },

    /// A runner was registered with the backend
    RunnerRegistered {
        name: String,
    },

    /// A runner was unregistered from the backend
    RunnerUnregistered {
        name: String,
    },

    /// A register/unregister call failed; retried via the next replanning
    RunnerFailed {
        name: String,
        error: String,
    },

    /// One reconciliation cycle finished
    CycleCompleted {
        registered: usize,
        unregistered: usize,
        unchanged: usize,
        failed: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core reconciliation engine
///
/// Owns the collaborators and the live registry, and drives sequential
/// reconciliation cycles until shutdown.
///
/// ## Lifecycle
///
/// 1. Create with [`BeaconEngine::new()`]
/// 2. Start with [`BeaconEngine::run()`]
/// 3. Engine runs until a shutdown signal is received
/// 4. Shutdown drains every live runner before returning
pub struct BeaconEngine {
    /// Interface enumeration
    interface_source: Box<dyn InterfaceSource>,

    /// Settings persistence
    settings_store: Box<dyn SettingsStore>,

    /// Live runner registry (shared with status readers)
    registry: RunnerRegistry,

    /// Engine tuning
    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl BeaconEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events for logging/monitoring.
    pub fn new(
        interface_source: Box<dyn InterfaceSource>,
        settings_store: Box<dyn SettingsStore>,
        backend: Arc<dyn AdvertisementBackend>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let registry = RunnerRegistry::new(
            backend,
            config.ttl_secs,
            Duration::from_secs(config.op_timeout_secs),
        );

        let engine = Self {
            interface_source,
            settings_store,
            registry,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Shared handle to the live registry, for read-only status consumers
    ///
    /// Snapshots taken from this handle are safe to read while the engine
    /// reconciles; all writes originate from the engine.
    pub fn registry(&self) -> RunnerRegistry {
        self.registry.clone()
    }

    /// Run the engine until SIGINT/ctrl-c
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown, registry drained
    /// - `Err(Error)`: the initial default configuration could not be
    ///   established (the only fatal startup error)
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            interval_secs: self.config.interval_secs,
        });

        if self.config.startup_delay_secs > 0 {
            debug!("Startup settle: {}s", self.config.startup_delay_secs);
            tokio::time::sleep(Duration::from_secs(self.config.startup_delay_secs)).await;
        }

        let mut settings = self.initial_settings().await?;
        let interval = Duration::from_secs(self.config.interval_secs);

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for provided shutdown signal
            loop {
                self.cycle(&mut settings).await;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT/SIGTERM
            loop {
                self.cycle(&mut settings).await;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }

        let failures = self.registry.drain().await;
        if failures > 0 {
            warn!(
                "Shutdown drain finished with {} failed unregistration(s)",
                failures
            );
        } else {
            info!("Shutdown drain complete, engine stopped");
        }
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Establish the settings to start from
    ///
    /// A failed or invalid load at startup is the first-run path: the
    /// builtin defaults are used and persisted. Failing to persist those
    /// defaults is the one fatal startup error.
    async fn initial_settings(&self) -> Result<Settings> {
        match self.settings_store.load().await {
            Ok(settings) => match settings.validate() {
                Ok(()) => return Ok(settings),
                Err(e) => warn!("Stored settings are invalid ({}), loading defaults", e),
            },
            Err(e) => warn!("No usable configuration found ({}), loading defaults", e),
        }

        let settings = Settings::builtin();
        if let Err(e) = self.settings_store.save(&settings).await {
            error!("Cannot persist initial default configuration: {}", e);
            return Err(e);
        }
        Ok(settings)
    }

    /// Run one reconciliation cycle
    async fn cycle(&self, settings: &mut Settings) {
        // 1. Reload settings; a failed reload keeps the previous settings
        // in effect rather than disturbing live advertisements.
        match self.settings_store.load().await {
            Ok(fresh) => match fresh.validate() {
                Ok(()) => *settings = fresh,
                Err(e) => {
                    warn!("Reloaded settings are invalid, keeping previous: {}", e);
                    self.emit_event(EngineEvent::SettingsReloadFailed {
                        error: e.to_string(),
                    });
                }
            },
            Err(e) => {
                warn!("Settings reload failed, keeping previous: {}", e);
                self.emit_event(EngineEvent::SettingsReloadFailed {
                    error: e.to_string(),
                });
            }
        }

        // 2. Rebuild the catalog (validates templates once per cycle)
        let catalog = ServiceCatalog::from_settings(settings);

        // 3. Re-enumerate interfaces. A whole-enumeration failure skips the
        // cycle; treating it as "no interfaces" would mass-unregister on a
        // transient fault.
        let interfaces = match self
            .interface_source
            .list_active(&settings.blacklist)
            .await
        {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!("Interface enumeration failed, skipping cycle: {}", e);
                return;
            }
        };

        // 4. Normalize: newly seen interfaces get a settings entry
        let normalized = settings.ensure_interfaces(interfaces.iter().map(|i| i.name.as_str()));

        // 5-6. Plan and reconcile
        let desired = planner::plan(&interfaces, settings, &catalog);
        let summary = self.registry.reconcile(desired).await;

        for name in &summary.registered {
            self.emit_event(EngineEvent::RunnerRegistered { name: name.clone() });
        }
        for name in &summary.unregistered {
            self.emit_event(EngineEvent::RunnerUnregistered { name: name.clone() });
        }
        for (name, error) in &summary.failed {
            self.emit_event(EngineEvent::RunnerFailed {
                name: name.clone(),
                error: error.clone(),
            });
        }
        if summary.has_changes() {
            info!(
                "Cycle: {} registered, {} unregistered, {} unchanged, {} failed",
                summary.registered.len(),
                summary.unregistered.len(),
                summary.unchanged,
                summary.failed.len()
            );
        } else {
            debug!("Cycle converged, no changes ({} unchanged)", summary.unchanged);
        }
        self.emit_event(EngineEvent::CycleCompleted {
            registered: summary.registered.len(),
            unregistered: summary.unregistered.len(),
            unchanged: summary.unchanged,
            failed: summary.failed.len(),
        });

        // 7. Persist normalization performed during this cycle
        if normalized {
            if let Err(e) = self.settings_store.save(settings).await {
                warn!("Failed to persist settings normalization: {}", e);
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging a warning if the channel is full. Dropping
        // keeps memory bounded when no consumer drains the receiver.
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// # Visibility
    ///
    /// This is `pub` for testing purposes only. Architecture contract tests
    /// require controlled shutdown; production code should use `run()`,
    /// which manages shutdown via OS signals.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
