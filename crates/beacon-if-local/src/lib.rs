// # Local Interface Source
//
// This crate provides an InterfaceSource that enumerates the host's own
// network interfaces via the `if-addrs` crate.
//
// ## Behavior
//
// - Interfaces are re-enumerated on every call; topology changes are
//   picked up by the engine's periodic replanning
// - Loopback addresses are always skipped (mDNS on loopback is noise)
// - Only IPv4 addresses are reported; advertisements are v4-only
// - Interfaces are returned sorted by name so planning sees a stable
//   order across cycles

use beacon_core::traits::{InterfaceSource, NetworkInterface};
use beacon_core::{Error, Result};
use std::net::IpAddr;
use tracing::debug;

/// InterfaceSource over the host's own interface table
#[derive(Debug, Clone, Default)]
pub struct LocalInterfaceSource;

impl LocalInterfaceSource {
    /// Create a new local interface source
    pub fn new() -> Self {
        Self
    }
}

/// Group flat (interface, address) pairs into per-interface entries,
/// applying the blacklist and keeping address order per interface.
fn group_interfaces(
    addresses: impl IntoIterator<Item = (String, IpAddr)>,
    blacklist: &[String],
) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = Vec::new();
    for (name, address) in addresses {
        if blacklist.iter().any(|prefix| name.starts_with(prefix)) {
            continue;
        }
        match interfaces.iter_mut().find(|i| i.name == name) {
            Some(interface) => interface.addresses.push(address),
            None => interfaces.push(NetworkInterface::new(name, vec![address])),
        }
    }
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    interfaces
}

#[async_trait::async_trait]
impl InterfaceSource for LocalInterfaceSource {
    async fn list_active(&self, blacklist: &[String]) -> Result<Vec<NetworkInterface>> {
        let addrs = if_addrs::get_if_addrs()
            .map_err(|e| Error::interface(format!("failed to enumerate interfaces: {e}")))?;

        let flat = addrs.into_iter().filter_map(|interface| {
            if interface.is_loopback() {
                return None;
            }
            let ip = interface.ip();
            if !ip.is_ipv4() {
                return None;
            }
            Some((interface.name, ip))
        });

        let interfaces = group_interfaces(flat, blacklist);
        debug!(
            "Enumerated {} active interface(s): {:?}",
            interfaces.len(),
            interfaces.iter().map(|i| i.name.as_str()).collect::<Vec<_>>()
        );
        Ok(interfaces)
    }
}
