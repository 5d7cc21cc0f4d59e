//! Architectural Contract Test: Drain Completeness
//!
//! After shutdown the live registry must be empty, and the backend's
//! unregister must have been issued exactly once for every runner that was
//! live immediately before shutdown — even if some of those calls fail.
//!
//! If this test fails, shutdown leaks advertisements (phantom mDNS entries
//! with no owner) or loses handles.

mod common;

use beacon_core::{BeaconEngine, MemorySettingsStore};
use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test]
async fn drain_unregisters_every_live_runner_exactly_once() {
    let backend = MockBackend::new();
    let registry = registry_with(&backend);

    registry
        .reconcile(desired_map([
            test_runner("a", "eth0", "10.0.0.1", &["http"]),
            test_runner("b", "eth1", "10.0.0.2", &["http"]),
            test_runner("c", "wlan0", "10.0.0.3", &["http"]),
        ]))
        .await;
    backend.reset_counters();

    let failures = registry.drain().await;

    assert_eq!(failures, 0);
    assert!(registry.is_empty().await);
    assert_eq!(backend.unregister_call_count(), 3);
    let drained: BTreeSet<_> = backend.unregistered_names().into_iter().collect();
    assert_eq!(
        drained,
        BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()])
    );
}

#[tokio::test]
async fn drain_issues_all_unregistrations_even_when_they_fail() {
    let backend = MockBackend::new();
    let registry = registry_with(&backend);

    registry
        .reconcile(desired_map([
            test_runner("a", "eth0", "10.0.0.1", &["http"]),
            test_runner("b", "eth1", "10.0.0.2", &["http"]),
        ]))
        .await;
    backend.set_fail_unregisters(true);
    backend.reset_counters();

    let failures = registry.drain().await;

    assert_eq!(failures, 2, "every failure is counted, none is fatal");
    assert!(
        registry.is_empty().await,
        "registry is empty regardless of backend failures"
    );
    assert_eq!(
        backend.unregister_call_count(),
        2,
        "best-effort drain still issues every unregistration"
    );
}

#[tokio::test]
async fn drain_of_empty_registry_is_a_no_op() {
    let backend = MockBackend::new();
    let registry = registry_with(&backend);

    assert_eq!(registry.drain().await, 0);
    assert_eq!(backend.unregister_call_count(), 0);
}

#[tokio::test]
async fn engine_shutdown_drains_the_registry() {
    let backend = MockBackend::new();
    let interfaces = MockInterfaceSource::new(vec![beacon_core::traits::NetworkInterface::new(
        "eth0",
        vec![ip("192.168.1.5")],
    )]);
    let store = MemorySettingsStore::with_settings(minimal_settings("beacon"));

    let (engine, _event_rx) = BeaconEngine::new(
        Box::new(interfaces),
        Box::new(store),
        Arc::new(backend.clone()),
        fast_config(),
    )
    .expect("engine construction succeeds");
    let registry = engine.registry();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Let the first cycle register the runner
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(registry.len().await, 1);
    assert_eq!(backend.register_call_count(), 1);

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    assert!(registry.is_empty().await, "shutdown must drain the registry");
    assert_eq!(
        backend.unregister_call_count(),
        1,
        "one unregister per previously-live runner"
    );
    assert_eq!(backend.unregistered_names(), vec!["beacon-eth0-1"]);
}
