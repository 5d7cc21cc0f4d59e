// # Interface Source Trait
//
// Defines the interface for enumerating active network interfaces.
//
// ## Implementations
//
// - if-addrs based (cross-platform): `beacon-if-local` crate
// - Test doubles: contract tests in this crate
//
// ## Usage
//
// ```rust,ignore
// use beacon_core::InterfaceSource;
//
// let source = /* InterfaceSource implementation */;
// let interfaces = source.list_active(&["lo".into(), "docker".into()]).await?;
// for iface in interfaces {
//     println!("{}: {:?}", iface.name, iface.addresses);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One active network interface, as seen at the start of a cycle
///
/// Supplied fresh by the source each cycle and never owned by the core;
/// the per-interface domain and advertise lists live in
/// [`Settings`](crate::config::Settings) and are joined by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Interface name (e.g., "eth0")
    pub name: String,

    /// Bound addresses, in the order the platform reports them
    pub addresses: Vec<IpAddr>,
}

impl NetworkInterface {
    /// Create an interface description
    pub fn new(name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            name: name.into(),
            addresses,
        }
    }
}

/// Rough interface classification, guessed from the name
///
/// Used only for status reporting; nothing in planning or reconciliation
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    /// Wired Ethernet (eth*, en*)
    Wired,
    /// Wireless (wlan*, wl*)
    Wireless,
    /// USB gadget/tether (usb*)
    Usb,
    /// Loopback (lo*)
    Loopback,
    /// Anything else
    Unknown,
}

impl InterfaceKind {
    /// Guess the kind from an interface name
    pub fn guess(name: &str) -> Self {
        if name.starts_with("eth") || name.starts_with("en") {
            InterfaceKind::Wired
        } else if name.starts_with("wl") {
            InterfaceKind::Wireless
        } else if name.starts_with("usb") {
            InterfaceKind::Usb
        } else if name.starts_with("lo") {
            InterfaceKind::Loopback
        } else {
            InterfaceKind::Unknown
        }
    }
}

/// Trait for interface enumeration implementations
///
/// The engine calls [`list_active`](InterfaceSource::list_active) once per
/// cycle; topology changes are picked up by replanning, so implementations
/// do not watch for changes or spawn tasks. Implementations must be
/// thread-safe and usable across async tasks.
#[async_trait]
pub trait InterfaceSource: Send + Sync {
    /// List currently active interfaces, excluding blacklisted names
    ///
    /// # Parameters
    ///
    /// - `blacklist`: interface name prefixes to exclude
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<NetworkInterface>)`: active interfaces with at least one
    ///   bound address, in a stable order
    /// - `Err(Error)`: if enumeration itself failed; the engine skips the
    ///   cycle rather than treating this as "no interfaces"
    async fn list_active(
        &self,
        blacklist: &[String],
    ) -> Result<Vec<NetworkInterface>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_guess_covers_common_names() {
        assert_eq!(InterfaceKind::guess("eth0"), InterfaceKind::Wired);
        assert_eq!(InterfaceKind::guess("enp3s0"), InterfaceKind::Wired);
        assert_eq!(InterfaceKind::guess("wlan0"), InterfaceKind::Wireless);
        assert_eq!(InterfaceKind::guess("wlp2s0"), InterfaceKind::Wireless);
        assert_eq!(InterfaceKind::guess("usb0"), InterfaceKind::Usb);
        assert_eq!(InterfaceKind::guess("lo"), InterfaceKind::Loopback);
        assert_eq!(InterfaceKind::guess("tailscale0"), InterfaceKind::Unknown);
    }
}
