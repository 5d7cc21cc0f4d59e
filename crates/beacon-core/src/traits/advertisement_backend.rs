// # Advertisement Backend Trait
//
// Defines the interface for the mDNS registration machinery.
//
// ## Implementations
//
// - mdns-sd based: `beacon-backend-mdns` crate
// - Test doubles: contract tests in this crate
//
// ## Responsibility boundaries
//
// Backends are single-shot executors. They perform one registration or
// unregistration per invocation and report success or failure; everything
// else is owned by the core:
//
// - Retry is replanning: a failed registration is retried because the next
//   cycle plans the runner again, not because the backend loops.
// - Deadlines are applied by the registry around every call; backends do
//   not need their own timeout handling.
// - Backends never decide whether an operation is needed; the registry's
//   diff already did.
//
// ## Usage
//
// ```rust,ignore
// use beacon_core::AdvertisementBackend;
//
// let backend = /* AdvertisementBackend implementation */;
// let handle = backend.register(&runner, 25).await?;
// // ... later ...
// backend.unregister(handle).await?;
// ```

use crate::announce::Runner;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;

/// Opaque token for one successful registration
///
/// Returned by [`AdvertisementBackend::register`] and consumed by
/// [`AdvertisementBackend::unregister`]. The internal representation is
/// private to the backend that issued it; the registry only stores it and
/// hands it back exactly once. A handle is valid only while its registry
/// entry is live.
pub struct AdvertisementHandle(Box<dyn Any + Send + Sync>);

impl AdvertisementHandle {
    /// Wrap a backend-private value in an opaque handle
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Box::new(inner))
    }

    /// Recover the backend-private value
    ///
    /// Fails (returning the handle unchanged) if the handle was issued by
    /// a different backend type.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Box<T>, AdvertisementHandle> {
        self.0.downcast::<T>().map_err(AdvertisementHandle)
    }
}

impl fmt::Debug for AdvertisementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdvertisementHandle(..)")
    }
}

/// Trait for advertisement backend implementations
///
/// Implementations must be thread-safe; the registry fans out register and
/// unregister calls for different runners concurrently within a cycle.
#[async_trait]
pub trait AdvertisementBackend: Send + Sync {
    /// Register all announcements of a runner
    ///
    /// Either the whole runner is registered and a handle is returned, or
    /// the call fails and nothing from this runner must remain advertised.
    ///
    /// # Parameters
    ///
    /// - `runner`: the runner whose announcement set to advertise
    /// - `ttl_secs`: requested record time-to-live
    ///
    /// # Returns
    ///
    /// - `Ok(AdvertisementHandle)`: token required for unregistration
    /// - `Err(Error)`: registration failed; the registry leaves the runner
    ///   out of the live map so the next cycle retries it
    async fn register(
        &self,
        runner: &Runner,
        ttl_secs: u32,
    ) -> Result<AdvertisementHandle, crate::Error>;

    /// Unregister a previously registered runner
    ///
    /// The handle is consumed either way; on failure the backend may keep
    /// broadcasting a phantom entry until its TTL expires.
    async fn unregister(&self, handle: AdvertisementHandle) -> Result<(), crate::Error>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
