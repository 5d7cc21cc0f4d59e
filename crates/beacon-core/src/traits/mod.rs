//! Core traits for the beacon system
//!
//! This module defines the abstract interfaces the engine drives.
//!
//! - [`InterfaceSource`]: enumerate active network interfaces
//! - [`SettingsStore`]: load/persist configuration
//! - [`AdvertisementBackend`]: perform mDNS registration/unregistration

pub mod advertisement_backend;
pub mod interface_source;
pub mod settings_store;

pub use advertisement_backend::{AdvertisementBackend, AdvertisementHandle};
pub use interface_source::{InterfaceKind, InterfaceSource, NetworkInterface};
pub use settings_store::SettingsStore;
