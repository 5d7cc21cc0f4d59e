//! Announcement and runner data model
//!
//! An [`Announcement`] describes one advertised service instance. A
//! [`Runner`] is a named bundle of announcements tied to one interface, IP
//! and domain; runners are the unit the registry diffs and the backend
//! registers. Runners are rebuilt fresh every cycle and never mutated in
//! place.

use crate::catalog::ServiceTemplate;
use crate::traits::InterfaceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

/// One advertised service instance
///
/// Derived deterministically from a service template, a domain name and an
/// IP address. The property bag is a `BTreeMap`, so equality is
/// order-independent and covers TXT contents; a properties-only change is a
/// real change and re-registers the runner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Announcement {
    /// Fully-qualified instance name, e.g. `beacon._http._tcp.local.`
    pub fullname: String,

    /// Host name the instance resolves to, e.g. `beacon.local.`
    pub hostname: String,

    /// DNS-SD service type, e.g. `_http._tcp.local.`
    pub service_type: String,

    /// Advertised port
    pub port: u16,

    /// TXT record key/value pairs
    pub properties: std::collections::BTreeMap<String, String>,

    /// Address the instance is advertised on
    pub address: IpAddr,
}

impl Announcement {
    /// Derive an announcement from a template for one domain and address
    pub fn from_template(template: &ServiceTemplate, domain: &str, address: IpAddr) -> Self {
        let service_type = template.service_type();
        Self {
            fullname: format!("{domain}.{service_type}"),
            hostname: format!("{domain}.local."),
            service_type,
            port: template.port,
            properties: template.properties.clone(),
            address,
        }
    }

    /// Instance label part of the fullname (the domain it was derived from)
    pub fn instance(&self) -> &str {
        self.fullname
            .split_once('.')
            .map(|(instance, _)| instance)
            .unwrap_or(&self.fullname)
    }
}

/// A named bundle of announcements for one interface, IP and domain
///
/// Runner names are unique within one planning pass; a collision is a
/// planning bug and is reported by the planner, never tolerated silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// Name, unique within one reconciliation cycle
    pub name: String,

    /// Source interface name
    pub interface: String,

    /// Source interface address the announcements are bound to
    pub address: IpAddr,

    /// Announcements this runner carries
    pub announcements: BTreeSet<Announcement>,
}

impl Runner {
    /// Create an empty runner
    pub fn new(name: impl Into<String>, interface: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            interface: interface.into(),
            address,
            announcements: BTreeSet::new(),
        }
    }

    /// Add an announcement
    pub fn add_announcement(&mut self, announcement: Announcement) {
        self.announcements.insert(announcement);
    }

    /// Flatten this runner into per-service status entries
    pub fn service_entries(&self) -> Vec<ServiceEntry> {
        self.announcements
            .iter()
            .map(|a| ServiceEntry {
                ip: self.address,
                fullname: a.fullname.clone(),
                hostname: a.hostname.clone(),
                service_type: a.service_type.clone(),
                port: a.port,
                interface: self.interface.clone(),
                interface_kind: InterfaceKind::guess(&self.interface),
            })
            .collect()
    }
}

/// Two runners are equal iff they carry the same announcement set from the
/// same source address. This is the sole basis for the registry's "no
/// change" decision; name and interface are the map-key context.
impl PartialEq for Runner {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.announcements == other.announcements
    }
}

impl Eq for Runner {}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Runner {} on {}, serving {:?}",
            self.name,
            self.address,
            self.announcements
                .iter()
                .map(|a| a.fullname.as_str())
                .collect::<Vec<_>>()
        )
    }
}

/// Read-only view of one live registry entry, for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct RunnerSnapshot {
    /// Runner name
    pub name: String,

    /// Source interface name
    pub interface: String,

    /// Source interface address
    pub address: IpAddr,

    /// When the backend registration succeeded
    pub registered_at: chrono::DateTime<chrono::Utc>,

    /// Announcements the runner carries
    pub announcements: Vec<Announcement>,
}

/// Flattened per-service status entry
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEntry {
    /// Address the service is advertised on
    pub ip: IpAddr,

    /// Fully-qualified instance name
    pub fullname: String,

    /// Host name the instance resolves to
    pub hostname: String,

    /// DNS-SD service type
    pub service_type: String,

    /// Advertised port
    pub port: u16,

    /// Source interface name
    pub interface: String,

    /// Kind guessed from the interface name
    pub interface_kind: InterfaceKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ServiceProtocol, ServiceTemplate};

    fn template() -> ServiceTemplate {
        ServiceTemplate::new("http", ServiceProtocol::Tcp, 80)
    }

    #[test]
    fn announcement_derivation_is_deterministic() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let a = Announcement::from_template(&template(), "blueos", ip);
        let b = Announcement::from_template(&template(), "blueos", ip);

        assert_eq!(a, b);
        assert_eq!(a.fullname, "blueos._http._tcp.local.");
        assert_eq!(a.hostname, "blueos.local.");
        assert_eq!(a.service_type, "_http._tcp.local.");
        assert_eq!(a.instance(), "blueos");
    }

    #[test]
    fn runner_equality_ignores_name_and_interface() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let mut a = Runner::new("beacon-eth0-1", "eth0", ip);
        a.add_announcement(Announcement::from_template(&template(), "beacon", ip));

        let mut b = Runner::new("renamed", "eth1", ip);
        b.add_announcement(Announcement::from_template(&template(), "beacon", ip));

        assert_eq!(a, b);
    }

    #[test]
    fn runner_equality_covers_address_and_properties() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let other_ip: IpAddr = "10.0.0.1".parse().unwrap();

        let mut a = Runner::new("r", "eth0", ip);
        a.add_announcement(Announcement::from_template(&template(), "beacon", ip));

        // Same announcements, different source address
        let mut b = a.clone();
        b.address = other_ip;
        assert_ne!(a, b);

        // Same address, properties-only difference
        let mut c = Runner::new("r", "eth0", ip);
        c.add_announcement(Announcement::from_template(
            &template().with_property("version", "2"),
            "beacon",
            ip,
        ));
        assert_ne!(a, c);
    }

    #[test]
    fn announcement_set_is_order_independent() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let ssh = ServiceTemplate::new("ssh", ServiceProtocol::Tcp, 22);

        let mut a = Runner::new("r", "eth0", ip);
        a.add_announcement(Announcement::from_template(&template(), "beacon", ip));
        a.add_announcement(Announcement::from_template(&ssh, "beacon", ip));

        let mut b = Runner::new("r", "eth0", ip);
        b.add_announcement(Announcement::from_template(&ssh, "beacon", ip));
        b.add_announcement(Announcement::from_template(&template(), "beacon", ip));

        assert_eq!(a, b);
    }

    #[test]
    fn service_entries_flatten_announcements() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let mut runner = Runner::new("beacon-eth0-1", "eth0", ip);
        runner.add_announcement(Announcement::from_template(&template(), "beacon", ip));

        let entries = runner.service_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip, ip);
        assert_eq!(entries[0].interface, "eth0");
        assert_eq!(entries[0].fullname, "beacon._http._tcp.local.");
    }
}
