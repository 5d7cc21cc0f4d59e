//! Live runner registry and reconciler
//!
//! The registry owns the map of currently registered runners and converges
//! it to each cycle's desired map:
//!
//! - desired but not live: register
//! - live but not desired: unregister and remove
//! - both, with unequal content: unregister the old handle, then register
//!   the replacement (sequenced per key)
//! - both, equal: no operation — unchanged configuration never re-triggers
//!   mDNS traffic
//!
//! Operations for different runners fan out concurrently and the call joins
//! them all before returning, so a cycle never leaves work in flight and no
//! runner ever has more than one outstanding operation. Every backend call
//! is bounded by a deadline; a timed-out call is an ordinary failure.
//!
//! Failure policy: a failed registration leaves the key absent from the
//! live map, so the next cycle replans and retries it (self-healing via
//! replanning, no retry bookkeeping here). A failed unregistration drops
//! the entry anyway, accepting a phantom broadcast until the record TTL
//! expires.

use crate::announce::{Runner, RunnerSnapshot, ServiceEntry};
use crate::traits::{AdvertisementBackend, AdvertisementHandle};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// One live registry entry: a runner plus the handle its registration
/// returned. The handle is valid only while the entry is live and is moved
/// out exactly once, on unregistration.
#[derive(Debug)]
struct LiveRunner {
    runner: Runner,
    handle: AdvertisementHandle,
    registered_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of one reconcile pass
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    /// Names newly registered (including replacements)
    pub registered: Vec<String>,

    /// Names unregistered (including the old side of replacements)
    pub unregistered: Vec<String>,

    /// Names left untouched because the desired runner was equal
    pub unchanged: usize,

    /// Per-key failures as (runner name, error message)
    pub failed: Vec<(String, String)>,
}

impl ReconcileSummary {
    /// Whether this pass issued any backend calls
    pub fn has_changes(&self) -> bool {
        !self.registered.is_empty() || !self.unregistered.is_empty() || !self.failed.is_empty()
    }
}

/// Per-key operation computed by the diff
enum KeyOp {
    Register {
        name: String,
        runner: Runner,
    },
    Unregister {
        name: String,
        handle: AdvertisementHandle,
    },
    /// Same name, different content: unregister old, then register new
    Replace {
        name: String,
        old_handle: AdvertisementHandle,
        runner: Runner,
    },
}

/// Per-key result of an executed operation
enum OpEvent {
    Registered(String, LiveRunner),
    Unregistered(String),
    RegisterFailed(String, String),
    UnregisterFailed(String, String),
}

/// Registry of live runners, shared between the reconciliation loop and
/// concurrent read-only status consumers
///
/// Cloning is cheap; all clones share the same live map and backend.
#[derive(Clone)]
pub struct RunnerRegistry {
    backend: Arc<dyn AdvertisementBackend>,
    ttl_secs: u32,
    op_timeout: Duration,
    live: Arc<RwLock<HashMap<String, LiveRunner>>>,
}

impl RunnerRegistry {
    /// Create an empty registry over the given backend
    pub fn new(backend: Arc<dyn AdvertisementBackend>, ttl_secs: u32, op_timeout: Duration) -> Self {
        Self {
            backend,
            ttl_secs,
            op_timeout,
            live: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Converge the live map to the desired map
    ///
    /// Never fails as a whole: per-key failures are logged, recorded in the
    /// summary and retried naturally on the next cycle.
    pub async fn reconcile(&self, desired: HashMap<String, Runner>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut ops = Vec::new();

        // Diff under the write lock; departing and changed entries give up
        // their handles here so each handle is consumed exactly once.
        {
            let mut live = self.live.write().await;

            let departed: Vec<String> = live
                .keys()
                .filter(|name| !desired.contains_key(*name))
                .cloned()
                .collect();
            for name in departed {
                if let Some(entry) = live.remove(&name) {
                    ops.push(KeyOp::Unregister {
                        name,
                        handle: entry.handle,
                    });
                }
            }

            for (name, runner) in desired {
                match live.entry(name.clone()) {
                    Entry::Occupied(entry) if entry.get().runner == runner => {
                        summary.unchanged += 1
                    }
                    Entry::Occupied(entry) => {
                        debug!("Runner {} has changed, replacing", name);
                        let old = entry.remove();
                        ops.push(KeyOp::Replace {
                            name,
                            old_handle: old.handle,
                            runner,
                        });
                    }
                    Entry::Vacant(_) => ops.push(KeyOp::Register { name, runner }),
                }
            }
        }

        if ops.is_empty() {
            return summary;
        }

        // Fan out one task per key, join them all before returning.
        let mut tasks = JoinSet::new();
        for op in ops {
            let backend = Arc::clone(&self.backend);
            let ttl_secs = self.ttl_secs;
            let op_timeout = self.op_timeout;
            tasks.spawn(async move { execute(backend, op, ttl_secs, op_timeout).await });
        }

        let mut events = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(mut task_events) => events.append(&mut task_events),
                Err(e) => error!("Reconcile task panicked: {}", e),
            }
        }

        // Fold results back into the live map.
        let mut live = self.live.write().await;
        for event in events {
            match event {
                OpEvent::Registered(name, entry) => {
                    info!("Registered {}", entry.runner);
                    live.insert(name.clone(), entry);
                    summary.registered.push(name);
                }
                OpEvent::Unregistered(name) => {
                    info!("Unregistered runner {}", name);
                    summary.unregistered.push(name);
                }
                OpEvent::RegisterFailed(name, error) => {
                    warn!("Failed to register runner {}: {}", name, error);
                    summary.failed.push((name, error));
                }
                OpEvent::UnregisterFailed(name, error) => {
                    warn!("Failed to unregister runner {}: {}", name, error);
                    summary.failed.push((name, error));
                }
            }
        }

        summary
    }

    /// Unregister every live runner (shutdown drain)
    ///
    /// Every unregistration is issued even if others fail; the map is empty
    /// afterwards regardless. Returns the number of failed unregistrations.
    pub async fn drain(&self) -> usize {
        let entries: Vec<(String, AdvertisementHandle)> = {
            let mut live = self.live.write().await;
            live.drain().map(|(name, entry)| (name, entry.handle)).collect()
        };

        if entries.is_empty() {
            return 0;
        }
        info!("Draining {} live runner(s)", entries.len());

        let mut tasks = JoinSet::new();
        for (name, handle) in entries {
            let backend = Arc::clone(&self.backend);
            let op_timeout = self.op_timeout;
            tasks.spawn(async move { unregister_one(backend, name, handle, op_timeout).await });
        }

        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(OpEvent::UnregisterFailed(name, error)) => {
                    warn!("Drain: failed to unregister {}: {}", name, error);
                    failures += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Drain task panicked: {}", e);
                    failures += 1;
                }
            }
        }
        failures
    }

    /// Snapshot of all live runners, keyed by runner name
    pub async fn snapshot(&self) -> BTreeMap<String, RunnerSnapshot> {
        let live = self.live.read().await;
        live.iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    RunnerSnapshot {
                        name: entry.runner.name.clone(),
                        interface: entry.runner.interface.clone(),
                        address: entry.runner.address,
                        registered_at: entry.registered_at,
                        announcements: entry.runner.announcements.iter().cloned().collect(),
                    },
                )
            })
            .collect()
    }

    /// Flattened per-service listing across all live runners
    pub async fn service_entries(&self) -> Vec<ServiceEntry> {
        let live = self.live.read().await;
        live.values()
            .flat_map(|entry| entry.runner.service_entries())
            .collect()
    }

    /// Number of live runners
    pub async fn len(&self) -> usize {
        self.live.read().await.len()
    }

    /// Whether no runner is live
    pub async fn is_empty(&self) -> bool {
        self.live.read().await.is_empty()
    }
}

/// Execute one key operation; replacement sequences unregister-then-register
/// for its key while other keys proceed concurrently.
async fn execute(
    backend: Arc<dyn AdvertisementBackend>,
    op: KeyOp,
    ttl_secs: u32,
    op_timeout: Duration,
) -> Vec<OpEvent> {
    match op {
        KeyOp::Register { name, runner } => {
            vec![register_one(backend, name, runner, ttl_secs, op_timeout).await]
        }
        KeyOp::Unregister { name, handle } => {
            vec![unregister_one(backend, name, handle, op_timeout).await]
        }
        KeyOp::Replace {
            name,
            old_handle,
            runner,
        } => {
            let unregister = unregister_one(Arc::clone(&backend), name.clone(), old_handle, op_timeout).await;
            let register = register_one(backend, name, runner, ttl_secs, op_timeout).await;
            vec![unregister, register]
        }
    }
}

async fn register_one(
    backend: Arc<dyn AdvertisementBackend>,
    name: String,
    runner: Runner,
    ttl_secs: u32,
    op_timeout: Duration,
) -> OpEvent {
    let result = tokio::time::timeout(op_timeout, backend.register(&runner, ttl_secs)).await;
    match result {
        Ok(Ok(handle)) => OpEvent::Registered(
            name,
            LiveRunner {
                runner,
                handle,
                registered_at: chrono::Utc::now(),
            },
        ),
        Ok(Err(e)) => OpEvent::RegisterFailed(name, e.to_string()),
        Err(_) => OpEvent::RegisterFailed(
            name,
            format!("register call exceeded {}s deadline", op_timeout.as_secs()),
        ),
    }
}

async fn unregister_one(
    backend: Arc<dyn AdvertisementBackend>,
    name: String,
    handle: AdvertisementHandle,
    op_timeout: Duration,
) -> OpEvent {
    let result = tokio::time::timeout(op_timeout, backend.unregister(handle)).await;
    match result {
        Ok(Ok(())) => OpEvent::Unregistered(name),
        Ok(Err(e)) => OpEvent::UnregisterFailed(name, e.to_string()),
        Err(_) => OpEvent::UnregisterFailed(
            name,
            format!("unregister call exceeded {}s deadline", op_timeout.as_secs()),
        ),
    }
}
