//! Service template catalog
//!
//! Settings reference services by identifier ("http", "ssh"); the catalog
//! maps each identifier to the template an announcement is built from.
//! Templates are validated once per cycle when the catalog is rebuilt, not
//! every time an announcement is constructed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::warn;

/// Transport tag of a DNS-SD service type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProtocol {
    /// `_tcp` services
    Tcp,
    /// `_udp` services
    Udp,
}

impl ServiceProtocol {
    /// DNS-SD label for this protocol ("_tcp" / "_udp")
    pub fn label(&self) -> &'static str {
        match self {
            ServiceProtocol::Tcp => "_tcp",
            ServiceProtocol::Udp => "_udp",
        }
    }
}

/// Advertisement template for one service
///
/// Immutable once loaded from settings for a cycle. The identifier doubles
/// as the DNS-SD type label: service "http" over TCP advertises as
/// `_http._tcp.local.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTemplate {
    /// Service identifier, referenced by advertise lists
    pub name: String,

    /// Transport protocol tag
    pub protocol: ServiceProtocol,

    /// Port the service listens on
    pub port: u16,

    /// TXT record key/value pairs
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ServiceTemplate {
    /// Create a template with an empty property bag
    pub fn new(name: impl Into<String>, protocol: ServiceProtocol, port: u16) -> Self {
        Self {
            name: name.into(),
            protocol,
            port,
            properties: BTreeMap::new(),
        }
    }

    /// Add a TXT property (builder style)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// DNS-SD service type, e.g. `_http._tcp.local.`
    pub fn service_type(&self) -> String {
        format!("_{}.{}.local.", self.name, self.protocol.label())
    }

    /// Validate the template
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::invalid_template("service name is empty"));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(crate::Error::invalid_template(format!(
                "service name '{}' contains invalid characters",
                self.name
            )));
        }
        if self.port == 0 {
            return Err(crate::Error::invalid_template(format!(
                "service '{}' has port 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Identifier-to-template map, rebuilt from settings each cycle
///
/// Invalid templates are dropped at build time with a warning; an advertise
/// list referencing a dropped or unknown identifier loses only that one
/// announcement (the planner logs and continues).
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    templates: HashMap<String, ServiceTemplate>,
}

impl ServiceCatalog {
    /// Build a catalog from the settings' service list
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        let mut templates = HashMap::new();
        for template in &settings.services {
            if let Err(e) = template.validate() {
                warn!("Dropping service template '{}': {}", template.name, e);
                continue;
            }
            if templates
                .insert(template.name.clone(), template.clone())
                .is_some()
            {
                warn!(
                    "Duplicate service template '{}', keeping the later entry",
                    template.name
                );
            }
        }
        Self { templates }
    }

    /// Look up a template by service identifier
    pub fn get(&self, name: &str) -> Option<&ServiceTemplate> {
        self.templates.get(name)
    }

    /// Number of usable templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog has no usable templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn service_type_is_dns_sd_shaped() {
        let template = ServiceTemplate::new("http", ServiceProtocol::Tcp, 80);
        assert_eq!(template.service_type(), "_http._tcp.local.");

        let template = ServiceTemplate::new("sidplay", ServiceProtocol::Udp, 6581);
        assert_eq!(template.service_type(), "_sidplay._udp.local.");
    }

    #[test]
    fn catalog_drops_invalid_templates() {
        let mut settings = Settings::builtin();
        settings.services.push(ServiceTemplate::new("broken", ServiceProtocol::Tcp, 0));
        settings.services.push(ServiceTemplate::new("ssh", ServiceProtocol::Tcp, 22));

        let catalog = ServiceCatalog::from_settings(&settings);
        assert!(catalog.get("broken").is_none());
        assert!(catalog.get("ssh").is_some());
        assert!(catalog.get("http").is_some());
    }

    #[test]
    fn catalog_keeps_later_duplicate() {
        let mut settings = Settings::builtin();
        settings.services.push(
            ServiceTemplate::new("http", ServiceProtocol::Tcp, 8080)
                .with_property("path", "/admin"),
        );

        let catalog = ServiceCatalog::from_settings(&settings);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("http").unwrap().port, 8080);
    }

    #[test]
    fn template_name_validation() {
        assert!(ServiceTemplate::new("has space", ServiceProtocol::Tcp, 80)
            .validate()
            .is_err());
        assert!(ServiceTemplate::new("", ServiceProtocol::Tcp, 80)
            .validate()
            .is_err());
        assert!(ServiceTemplate::new("ok-name", ServiceProtocol::Tcp, 80)
            .validate()
            .is_ok());
    }
}
