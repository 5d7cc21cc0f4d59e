//! Runner planning
//!
//! Derives the desired runner map for one cycle from the active interfaces,
//! the current settings and the service catalog. Planning is pure: it never
//! touches the backend or the live registry, and it is re-run from scratch
//! every cycle.
//!
//! Two families of runners are produced:
//!
//! - **Default runners**: every active interface advertises the default
//!   domains and services, named `{domain}-{interface}-{count}` with a
//!   per-interface ordinal disambiguating multiple IPs and domains.
//! - **User runners**: interfaces with their own configured domains
//!   advertise that interface's service list, named `{interface}-{domain}`.
//!
//! [`plan`] is the union of both; user names win when they collide with a
//! default name.

use crate::announce::{Announcement, Runner};
use crate::catalog::ServiceCatalog;
use crate::config::Settings;
use crate::traits::NetworkInterface;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Compute the desired runner map for one cycle
///
/// Union of [`default_runners`] and [`user_runners`]; user runner names
/// take precedence on key collision.
pub fn plan(
    interfaces: &[NetworkInterface],
    settings: &Settings,
    catalog: &ServiceCatalog,
) -> HashMap<String, Runner> {
    let mut desired = default_runners(interfaces, settings, catalog);
    for (name, runner) in user_runners(interfaces, settings, catalog) {
        if desired.contains_key(&name) {
            debug!("User runner {} overrides default runner of the same name", name);
        }
        desired.insert(name, runner);
    }
    desired
}

/// Build the default runners for every active interface
///
/// One runner per interface x bound IP x default domain, each carrying one
/// announcement per service in the default advertise list.
pub fn default_runners(
    interfaces: &[NetworkInterface],
    settings: &Settings,
    catalog: &ServiceCatalog,
) -> HashMap<String, Runner> {
    let mut runners = HashMap::new();
    for interface in interfaces {
        if interface.addresses.is_empty() {
            warn!("Interface {} has no bound addresses, skipping", interface.name);
            continue;
        }
        let mut count = 1;
        for &ip in &interface.addresses {
            for domain in &settings.default.domain_names {
                let runner_name = format!("{}-{}-{}", domain, interface.name, count);
                let runner = build_runner(
                    &runner_name,
                    interface,
                    ip,
                    &runner_name,
                    &settings.default.advertise,
                    catalog,
                );
                insert_unique(&mut runners, runner);
                count += 1;
            }
        }
    }
    runners
}

/// Build the user runners from per-interface settings
///
/// One runner per interface x bound IP x interface-specific domain, each
/// carrying one announcement per service in that interface's advertise
/// list. The name is derived from interface and domain only, so an
/// interface with several bound IPs collides; the collision is reported
/// and the first-built runner wins.
pub fn user_runners(
    interfaces: &[NetworkInterface],
    settings: &Settings,
    catalog: &ServiceCatalog,
) -> HashMap<String, Runner> {
    let mut runners = HashMap::new();
    for interface in interfaces {
        let Some(interface_settings) = settings.interface(&interface.name) else {
            continue;
        };
        for &ip in &interface.addresses {
            for domain in &interface_settings.domain_names {
                let runner_name = format!("{}-{}", interface.name, domain);
                let runner = build_runner(
                    &runner_name,
                    interface,
                    ip,
                    domain,
                    &interface_settings.advertise,
                    catalog,
                );
                insert_unique(&mut runners, runner);
            }
        }
    }
    runners
}

/// Build one runner, skipping announcements that cannot be constructed
///
/// An unknown service identifier loses only that announcement; the rest of
/// the runner is still built. A runner that ends up carrying nothing is
/// dropped (`None`) so the registry never churns on empty registrations.
fn build_runner(
    runner_name: &str,
    interface: &NetworkInterface,
    ip: std::net::IpAddr,
    domain: &str,
    advertise: &[String],
    catalog: &ServiceCatalog,
) -> Option<Runner> {
    let mut runner = Runner::new(runner_name, &interface.name, ip);
    for service_name in advertise {
        match catalog.get(service_name) {
            Some(template) => {
                runner.add_announcement(Announcement::from_template(template, domain, ip));
            }
            None => {
                warn!(
                    "Unknown service '{}' advertised on {}-{}, skipping this announcement",
                    service_name, interface.name, domain
                );
            }
        }
    }
    if runner.announcements.is_empty() {
        debug!("Runner {} carries no announcements, dropping", runner_name);
        return None;
    }
    debug!("Planned {}", runner);
    Some(runner)
}

/// Insert a planned runner, surfacing name collisions
///
/// Duplicate names within one planning pass are a planning bug; they are
/// reported at error level and the first-built runner is kept so the cycle
/// still converges deterministically.
fn insert_unique(runners: &mut HashMap<String, Runner>, runner: Option<Runner>) {
    let Some(runner) = runner else { return };
    if let Some(existing) = runners.get(&runner.name) {
        error!(
            "Runner name collision within one planning pass: {} (kept {} on {}, dropped duplicate on {})",
            runner.name, existing.name, existing.address, runner.address
        );
        return;
    }
    runners.insert(runner.name.clone(), runner);
}
