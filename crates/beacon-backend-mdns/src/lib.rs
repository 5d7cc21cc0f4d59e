// # mDNS Advertisement Backend
//
// This crate provides the production AdvertisementBackend implementation
// using the `mdns-sd` crate for multicast DNS service registration.
//
// ## Model
//
// Each registered runner gets its own `mdns_sd::ServiceDaemon` carrying
// that runner's announcements. The daemon and the registered fullnames
// travel inside the opaque handle; unregistration unregisters every
// fullname and shuts the daemon down. One daemon per runner keeps
// unregistration exact: tearing down a runner can never disturb another
// runner's records.
//
// ## Failure Behavior
//
// Registration is all-or-nothing per runner: if any announcement fails to
// register, the daemon is shut down so no partial advertisement lingers,
// and the error is returned for the registry to retry next cycle.

use beacon_core::announce::{Announcement, Runner};
use beacon_core::traits::{AdvertisementBackend, AdvertisementHandle};
use beacon_core::{Error, Result};
use mdns_sd::{ServiceDaemon, ServiceInfo};
use std::collections::HashMap;
use tracing::{debug, warn};

const BACKEND_NAME: &str = "mdns-sd";

/// Handle contents for one registered runner
struct MdnsRegistration {
    daemon: ServiceDaemon,
    fullnames: Vec<String>,
}

/// mDNS-based implementation of AdvertisementBackend
///
/// # Example
///
/// ```no_run
/// use beacon_backend_mdns::MdnsBackend;
/// use std::sync::Arc;
/// use beacon_core::traits::AdvertisementBackend;
///
/// let backend: Arc<dyn AdvertisementBackend> = Arc::new(MdnsBackend::new());
/// ```
#[derive(Debug, Default)]
pub struct MdnsBackend;

impl MdnsBackend {
    /// Create a new mDNS backend
    pub fn new() -> Self {
        Self
    }
}

/// Build the mdns-sd service description for one announcement
fn build_service_info(announcement: &Announcement) -> Result<ServiceInfo> {
    // mdns-sd takes the TXT bag as owned key/value strings
    let properties: HashMap<String, String> = announcement
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    ServiceInfo::new(
        &announcement.service_type,
        announcement.instance(),
        &announcement.hostname,
        announcement.address,
        announcement.port,
        properties,
    )
    .map_err(|e| {
        Error::backend(
            BACKEND_NAME,
            format!("invalid service info for {}: {}", announcement.fullname, e),
        )
    })
}

#[async_trait::async_trait]
impl AdvertisementBackend for MdnsBackend {
    async fn register(&self, runner: &Runner, ttl_secs: u32) -> Result<AdvertisementHandle> {
        let daemon = ServiceDaemon::new().map_err(|e| {
            Error::backend(BACKEND_NAME, format!("failed to create mDNS daemon: {e}"))
        })?;

        // Record timing is managed by the daemon per RFC 6762; the
        // requested TTL is surfaced for debugging only.
        debug!(
            "Registering {} announcement(s) for runner {} (requested ttl {}s)",
            runner.announcements.len(),
            runner.name,
            ttl_secs
        );

        let mut fullnames = Vec::with_capacity(runner.announcements.len());
        for announcement in &runner.announcements {
            let info = match build_service_info(announcement) {
                Ok(info) => info,
                Err(e) => {
                    abandon(&daemon, &runner.name);
                    return Err(e);
                }
            };
            let fullname = info.get_fullname().to_string();
            if let Err(e) = daemon.register(info) {
                abandon(&daemon, &runner.name);
                return Err(Error::registration(format!(
                    "{} on {}: {}",
                    fullname, runner.address, e
                )));
            }
            fullnames.push(fullname);
        }

        Ok(AdvertisementHandle::new(MdnsRegistration {
            daemon,
            fullnames,
        }))
    }

    async fn unregister(&self, handle: AdvertisementHandle) -> Result<()> {
        let registration = handle
            .downcast::<MdnsRegistration>()
            .map_err(|_| Error::backend(BACKEND_NAME, "handle was not issued by this backend"))?;

        let mut first_error: Option<Error> = None;
        for fullname in &registration.fullnames {
            match registration.daemon.unregister(fullname) {
                Ok(rx) => {
                    // Wait for the daemon to confirm the goodbye packets.
                    if let Err(e) = rx.recv_async().await {
                        warn!("No unregister confirmation for {}: {}", fullname, e);
                    }
                }
                Err(e) => {
                    warn!("Failed to unregister {}: {}", fullname, e);
                    first_error.get_or_insert_with(|| {
                        Error::unregistration(format!("{fullname}: {e}"))
                    });
                }
            }
        }

        if let Err(e) = registration.daemon.shutdown() {
            warn!("Failed to shut down mDNS daemon: {}", e);
            first_error.get_or_insert_with(|| {
                Error::backend(BACKEND_NAME, format!("daemon shutdown failed: {e}"))
            });
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }
}

/// Tear a daemon down after a partial registration failure so no
/// half-registered runner keeps broadcasting.
fn abandon(daemon: &ServiceDaemon, runner_name: &str) {
    if let Err(e) = daemon.shutdown() {
        warn!(
            "Failed to shut down daemon after aborted registration of {}: {}",
            runner_name, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::catalog::{ServiceProtocol, ServiceTemplate};
    use std::net::IpAddr;

    #[test]
    fn service_info_matches_announcement_fullname() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let template = ServiceTemplate::new("http", ServiceProtocol::Tcp, 80)
            .with_property("path", "/index.html");
        let announcement = Announcement::from_template(&template, "beacon-eth0-1", ip);

        let info = build_service_info(&announcement).expect("valid service info");
        assert_eq!(info.get_fullname(), announcement.fullname);
        assert_eq!(info.get_port(), 80);
    }

    #[test]
    fn hostname_keeps_local_suffix() {
        let ip: IpAddr = "10.0.0.3".parse().unwrap();
        let template = ServiceTemplate::new("ssh", ServiceProtocol::Tcp, 22);
        let announcement = Announcement::from_template(&template, "bench", ip);

        assert!(announcement.hostname.ends_with(".local."));
        let info = build_service_info(&announcement).expect("valid service info");
        assert_eq!(info.get_hostname(), "bench.local.");
    }
}
