//! Configuration types for the beacon system
//!
//! This module defines the persisted settings shape and the engine tuning
//! knobs. Settings are reloaded from the [`SettingsStore`] every cycle, so
//! configuration changes take effect without a restart.
//!
//! [`SettingsStore`]: crate::traits::SettingsStore

use crate::catalog::ServiceTemplate;
use serde::{Deserialize, Serialize};

/// Persisted beacon settings
///
/// This is the unit the [`SettingsStore`](crate::traits::SettingsStore)
/// loads and saves. It covers:
/// - which interfaces are excluded from advertisement (`blacklist`)
/// - the default domains/services advertised on every active interface
/// - per-interface overrides
/// - the service template catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Interface name prefixes that are never advertised on
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Domains and services advertised on every active interface
    pub default: DomainConfig,

    /// Per-interface domain/service overrides
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,

    /// Service templates referenced by the advertise lists
    #[serde(default)]
    pub services: Vec<ServiceTemplate>,
}

impl Settings {
    /// Built-in defaults, used when no settings file exists yet
    pub fn builtin() -> Self {
        Self {
            blacklist: vec!["lo".to_string(), "docker".to_string(), "veth".to_string()],
            default: DomainConfig {
                domain_names: vec!["beacon".to_string()],
                advertise: vec!["http".to_string()],
            },
            interfaces: Vec::new(),
            services: vec![ServiceTemplate::new("http", crate::catalog::ServiceProtocol::Tcp, 80)],
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        for domain in &self.default.domain_names {
            validate_domain_label(domain)?;
        }
        for interface in &self.interfaces {
            if interface.name.is_empty() {
                return Err(crate::Error::config("Interface override has empty name"));
            }
            for domain in &interface.domain_names {
                validate_domain_label(domain)?;
            }
        }
        Ok(())
    }

    /// Get the override entry for an interface, if one exists
    pub fn interface(&self, name: &str) -> Option<&InterfaceConfig> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Ensure an override entry exists for every given interface name
    ///
    /// Newly seen interfaces get an empty entry (no extra domains, nothing
    /// advertised beyond the defaults) so users find them in the settings
    /// file ready to edit. Returns `true` if any entry was added, in which
    /// case the caller is expected to persist the settings.
    pub fn ensure_interfaces<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> bool {
        let mut changed = false;
        for name in names {
            if self.interface(name).is_none() {
                self.interfaces.push(InterfaceConfig {
                    name: name.to_string(),
                    domain_names: Vec::new(),
                    advertise: Vec::new(),
                });
                changed = true;
            }
        }
        changed
    }

    /// Check whether an interface name matches the blacklist
    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.iter().any(|prefix| name.starts_with(prefix))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Default domains and advertise list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain names advertised on every active interface
    pub domain_names: Vec<String>,

    /// Service identifiers advertised under those domains
    #[serde(default)]
    pub advertise: Vec<String>,
}

/// Per-interface domain/service overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name (e.g., "eth0")
    pub name: String,

    /// Extra domain names advertised on this interface only
    #[serde(default)]
    pub domain_names: Vec<String>,

    /// Service identifiers advertised under this interface's domains
    #[serde(default)]
    pub advertise: Vec<String>,
}

/// Validate that a string is usable as a single DNS label
///
/// Domain names here are single labels ("beacon", not "beacon.local"); the
/// ".local." suffix is appended when announcements are derived.
fn validate_domain_label(label: &str) -> Result<(), crate::Error> {
    if label.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }
    if label.len() > 63 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 63): '{}'",
            label.len(),
            label
        )));
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(crate::Error::config(format!(
            "Domain name contains invalid characters: '{}'. Valid: alphanumeric and hyphen.",
            label
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(crate::Error::config(format!(
            "Domain name cannot start or end with hyphen: '{}'",
            label
        )));
    }
    Ok(())
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between reconciliation cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// TTL in seconds passed to the advertisement backend on registration
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u32,

    /// Deadline for a single backend register/unregister call
    ///
    /// A call that exceeds this deadline is treated as a failure; the
    /// runner is retried on the next cycle via replanning.
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,

    /// Delay before the first cycle, letting interfaces settle after boot
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log) to
    /// keep memory bounded when no consumer is draining them.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("interval_secs must be > 0"));
        }
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("ttl_secs must be > 0"));
        }
        if self.op_timeout_secs == 0 {
            return Err(crate::Error::config("op_timeout_secs must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            ttl_secs: default_ttl_secs(),
            op_timeout_secs: default_op_timeout_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_ttl_secs() -> u32 {
    25
}

fn default_op_timeout_secs() -> u64 {
    15
}

fn default_startup_delay_secs() -> u64 {
    0
}

fn default_event_channel_capacity() -> usize {
    1000
}
