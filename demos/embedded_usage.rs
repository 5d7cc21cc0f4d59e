//! Minimal embedding example for beacon-core
//!
//! This example demonstrates using beacon-core as a library in a custom
//! application: every collaborator is application-provided (no real mDNS,
//! no real interfaces), and the engine lifecycle is fully managed by the
//! application.

#![allow(dead_code)]

use beacon_core::announce::Runner;
use beacon_core::config::Settings;
use beacon_core::traits::{
    AdvertisementBackend, AdvertisementHandle, InterfaceSource, NetworkInterface,
};
use beacon_core::{BeaconEngine, EngineConfig, MemorySettingsStore, Result};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Custom interface source for embedded usage
struct EmbeddedInterfaceSource {
    interfaces: Vec<NetworkInterface>,
}

#[async_trait::async_trait]
impl InterfaceSource for EmbeddedInterfaceSource {
    async fn list_active(&self, blacklist: &[String]) -> Result<Vec<NetworkInterface>> {
        Ok(self
            .interfaces
            .iter()
            .filter(|i| !blacklist.iter().any(|p| i.name.starts_with(p)))
            .cloned()
            .collect())
    }
}

/// Custom advertisement backend for embedded usage
struct EmbeddedBackend {
    register_calls: Arc<AtomicUsize>,
    next_token: AtomicU64,
}

impl EmbeddedBackend {
    fn new() -> Self {
        Self {
            register_calls: Arc::new(AtomicUsize::new(0)),
            next_token: AtomicU64::new(1),
        }
    }
}

#[async_trait::async_trait]
impl AdvertisementBackend for EmbeddedBackend {
    async fn register(&self, runner: &Runner, ttl_secs: u32) -> Result<AdvertisementHandle> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] Registering {} (ttl {}s)", runner, ttl_secs);
        Ok(AdvertisementHandle::new(
            self.next_token.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn unregister(&self, handle: AdvertisementHandle) -> Result<()> {
        let token = handle
            .downcast::<u64>()
            .map_err(|_| beacon_core::Error::unregistration("foreign handle"))?;
        println!("[Embedded] Unregistering handle #{}", token);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded beacon-core Example ===\n");

    // Create custom components
    let ip: IpAddr = IpAddr::from([192, 168, 1, 5]);
    let interface_source = EmbeddedInterfaceSource {
        interfaces: vec![NetworkInterface::new("eth0", vec![ip])],
    };
    let settings_store = MemorySettingsStore::with_settings(Settings::builtin());
    let backend = Arc::new(EmbeddedBackend::new());

    // Create configuration (fast cycles for the demo)
    let config = EngineConfig {
        interval_secs: 1,
        ..EngineConfig::default()
    };

    // Create engine
    println!("1. Creating engine...");
    let (engine, mut event_rx) = BeaconEngine::new(
        Box::new(interface_source),
        Box::new(settings_store),
        backend,
        config,
    )?;
    let registry = engine.registry();

    // Spawn event listener (optional)
    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    // Run engine in background with an application-controlled shutdown
    println!("2. Starting engine in background...");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Let a couple of cycles run
    tokio::time::sleep(tokio::time::Duration::from_millis(2500)).await;

    // Read the live registry while the engine runs
    println!("\n3. Live snapshot:");
    for (name, snapshot) in registry.snapshot().await {
        println!(
            "   {} on {} ({} announcement(s))",
            name,
            snapshot.address,
            snapshot.announcements.len()
        );
    }

    // Stop the engine; shutdown drains every live runner
    println!("\n4. Stopping engine...");
    let _ = shutdown_tx.send(());
    engine_handle.await.expect("engine task joins")?;

    let _ = tokio::time::timeout(tokio::time::Duration::from_millis(100), event_listener).await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Engine lifecycle is fully controlled by the application");
    println!("- All collaborators are custom (no real mDNS involved)");
    println!("- Registry snapshots are safe to read concurrently");
    println!("- Shutdown drained the registry before returning");

    Ok(())
}
