//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal mock collaborators that verify the
//! reconciliation contracts without touching real mDNS or real interfaces.

#![allow(dead_code)]

use beacon_core::announce::{Announcement, Runner};
use beacon_core::catalog::{ServiceProtocol, ServiceTemplate};
use beacon_core::config::Settings;
use beacon_core::error::Result;
use beacon_core::traits::{
    AdvertisementBackend, AdvertisementHandle, InterfaceSource, NetworkInterface, SettingsStore,
};
use beacon_core::Error;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Handle representation private to the mock backend
pub struct MockHandle {
    pub token: u64,
    pub runner_name: String,
}

/// A mock AdvertisementBackend that tracks calls and injects failures
///
/// Cloning shares all counters, so a clone can be handed to the registry
/// while the test keeps the original for assertions.
#[derive(Clone, Default)]
pub struct MockBackend {
    register_calls: Arc<AtomicUsize>,
    unregister_calls: Arc<AtomicUsize>,
    registered: Arc<Mutex<Vec<String>>>,
    unregistered: Arc<Mutex<Vec<String>>>,
    call_log: Arc<Mutex<Vec<(&'static str, String)>>>,
    fail_register: Arc<Mutex<HashSet<String>>>,
    fail_unregisters: Arc<AtomicBool>,
    last_ttl: Arc<AtomicU32>,
    next_token: Arc<AtomicU64>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times register() was called
    pub fn register_call_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// Number of times unregister() was called
    pub fn unregister_call_count(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }

    /// Runner names passed to register(), in call order
    pub fn registered_names(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }

    /// Runner names recovered from handles passed to unregister()
    pub fn unregistered_names(&self) -> Vec<String> {
        self.unregistered.lock().unwrap().clone()
    }

    /// Every backend call in order, as ("register"|"unregister", runner name)
    pub fn call_log(&self) -> Vec<(&'static str, String)> {
        self.call_log.lock().unwrap().clone()
    }

    /// TTL passed to the most recent register() call
    pub fn last_ttl(&self) -> u32 {
        self.last_ttl.load(Ordering::SeqCst)
    }

    /// Make register() fail for the given runner name
    pub fn fail_register_for(&self, name: &str) {
        self.fail_register.lock().unwrap().insert(name.to_string());
    }

    /// Stop failing register() for the given runner name
    pub fn heal_register_for(&self, name: &str) {
        self.fail_register.lock().unwrap().remove(name);
    }

    /// Make every unregister() call fail (the call is still recorded)
    pub fn set_fail_unregisters(&self, fail: bool) {
        self.fail_unregisters.store(fail, Ordering::SeqCst);
    }

    /// Forget all recorded calls (counters and name logs)
    pub fn reset_counters(&self) {
        self.register_calls.store(0, Ordering::SeqCst);
        self.unregister_calls.store(0, Ordering::SeqCst);
        self.registered.lock().unwrap().clear();
        self.unregistered.lock().unwrap().clear();
        self.call_log.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl AdvertisementBackend for MockBackend {
    async fn register(&self, runner: &Runner, ttl_secs: u32) -> Result<AdvertisementHandle> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.last_ttl.store(ttl_secs, Ordering::SeqCst);
        self.call_log
            .lock()
            .unwrap()
            .push(("register", runner.name.clone()));

        if self.fail_register.lock().unwrap().contains(&runner.name) {
            return Err(Error::registration(format!(
                "injected failure for {}",
                runner.name
            )));
        }

        self.registered.lock().unwrap().push(runner.name.clone());
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        Ok(AdvertisementHandle::new(MockHandle {
            token,
            runner_name: runner.name.clone(),
        }))
    }

    async fn unregister(&self, handle: AdvertisementHandle) -> Result<()> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);

        let handle = handle
            .downcast::<MockHandle>()
            .map_err(|_| Error::unregistration("handle was not issued by this backend"))?;
        self.call_log
            .lock()
            .unwrap()
            .push(("unregister", handle.runner_name.clone()));
        self.unregistered.lock().unwrap().push(handle.runner_name);

        if self.fail_unregisters.load(Ordering::SeqCst) {
            return Err(Error::unregistration("injected unregister failure"));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// A controlled InterfaceSource whose interface list the test swaps at will
#[derive(Clone, Default)]
pub struct MockInterfaceSource {
    interfaces: Arc<Mutex<Vec<NetworkInterface>>>,
    fail: Arc<AtomicBool>,
    list_calls: Arc<AtomicUsize>,
}

impl MockInterfaceSource {
    pub fn new(interfaces: Vec<NetworkInterface>) -> Self {
        Self {
            interfaces: Arc::new(Mutex::new(interfaces)),
            ..Self::default()
        }
    }

    /// Replace the interface list (takes effect next cycle)
    pub fn set(&self, interfaces: Vec<NetworkInterface>) {
        *self.interfaces.lock().unwrap() = interfaces;
    }

    /// Make list_active() fail entirely
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InterfaceSource for MockInterfaceSource {
    async fn list_active(&self, blacklist: &[String]) -> Result<Vec<NetworkInterface>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::interface("injected enumeration failure"));
        }
        Ok(self
            .interfaces
            .lock()
            .unwrap()
            .iter()
            .filter(|i| !blacklist.iter().any(|prefix| i.name.starts_with(prefix)))
            .cloned()
            .collect())
    }
}

/// A settings store whose loads can be made to fail on demand
#[derive(Clone)]
pub struct FlakySettingsStore {
    inner: beacon_core::MemorySettingsStore,
    fail_loads: Arc<AtomicBool>,
    save_calls: Arc<AtomicUsize>,
}

impl FlakySettingsStore {
    pub fn empty() -> Self {
        Self {
            inner: beacon_core::MemorySettingsStore::new(),
            fail_loads: Arc::new(AtomicBool::new(false)),
            save_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: beacon_core::MemorySettingsStore::with_settings(settings),
            fail_loads: Arc::new(AtomicBool::new(false)),
            save_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Option<Settings> {
        self.inner.get().await
    }

    pub async fn set(&self, settings: Settings) {
        self.inner.set(settings).await;
    }
}

#[async_trait::async_trait]
impl SettingsStore for FlakySettingsStore {
    async fn load(&self) -> Result<Settings> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Error::settings("injected load failure"));
        }
        self.inner.load().await
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.save(settings).await
    }
}

/// Parse an IP address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test IP")
}

/// Build a runner carrying one announcement per service identifier
///
/// The runner name doubles as the announcement domain, mirroring how the
/// planner builds default runners.
pub fn test_runner(name: &str, interface: &str, addr: &str, services: &[&str]) -> Runner {
    let address = ip(addr);
    let mut runner = Runner::new(name, interface, address);
    for service in services {
        let template = ServiceTemplate::new(*service, ServiceProtocol::Tcp, 80);
        runner.add_announcement(Announcement::from_template(&template, name, address));
    }
    runner
}

/// Settings with one interface-agnostic default service ("http") and an
/// empty blacklist, suitable for most contract tests
pub fn minimal_settings(domain: &str) -> Settings {
    Settings {
        blacklist: Vec::new(),
        default: beacon_core::config::DomainConfig {
            domain_names: vec![domain.to_string()],
            advertise: vec!["http".to_string()],
        },
        interfaces: Vec::new(),
        services: vec![ServiceTemplate::new("http", ServiceProtocol::Tcp, 80)],
    }
}

/// Registry over a clone of the given mock backend, with test deadlines
pub fn registry_with(backend: &MockBackend) -> beacon_core::RunnerRegistry {
    beacon_core::RunnerRegistry::new(
        Arc::new(backend.clone()),
        25,
        std::time::Duration::from_secs(2),
    )
}

/// Desired map from a list of runners, keyed by runner name
pub fn desired_map(
    runners: impl IntoIterator<Item = Runner>,
) -> std::collections::HashMap<String, Runner> {
    runners
        .into_iter()
        .map(|r| (r.name.clone(), r))
        .collect()
}

/// Fast engine config for tests: 1s cycles, short deadlines
pub fn fast_config() -> beacon_core::EngineConfig {
    beacon_core::EngineConfig {
        interval_secs: 1,
        ttl_secs: 25,
        op_timeout_secs: 2,
        startup_delay_secs: 0,
        event_channel_capacity: 100,
    }
}
