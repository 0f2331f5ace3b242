//! Device adapters and the type registry.
//!
//! A device adapter owns the vendor-specific glue between a raw
//! transport payload and one protocol decoder: which decoder applies,
//! which configured secrets it needs, which messages to skip, and how
//! the decoded record flattens into the property bag. Adapters are
//! looked up by a configured device-type string through an explicit
//! [`Registry`] value.
//!
//! `decode` returning `Ok(None)` means "not this kind of message, skip":
//! recoverable conditions (no resolvable bind key, foreign bus traffic,
//! event-less frames) are not failures.

mod lywsd03mmc;
mod p1p2;
mod passthrough;
mod shelly;

use std::collections::BTreeMap;
use std::collections::HashMap;

use thiserror::Error;

use crate::DeviceData;
use crate::decoders::bthome::BtHomeError;
use crate::decoders::hvac::HvacError;
use crate::decoders::mibeacon::MiBeaconError;

/// One configured device: a name, the registered type to instantiate,
/// and free-form properties (MAC address, encryption key, topic
/// filters). Secrets live here, owned by configuration, never by the
/// decoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub device_type: String,
    pub properties: BTreeMap<String, String>,
}

impl DeviceConfig {
    pub fn property(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    fn require_property(&self, property: &str) -> Result<&str, DeviceError> {
        self.property(property).ok_or_else(|| DeviceError::MissingProperty {
            device: self.name.clone(),
            property: property.to_string(),
        })
    }
}

/// Vendor-specific payload-to-reading adapter.
pub trait Device: Send + Sync {
    /// Decode one message. `Ok(None)` skips the message; an error is
    /// fatal for the message only and must leave no shared state behind.
    fn decode(&self, data: &DeviceData) -> Result<Option<DeviceData>, DeviceError>;
}

impl std::fmt::Debug for dyn Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Device")
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown device type: {device_type}")]
    UnknownType { device_type: String },
    #[error("device type already registered: {device_type}")]
    AlreadyRegistered { device_type: String },
    #[error("device {device}: missing required property: {property}")]
    MissingProperty { device: String, property: String },
    #[error("device {device}: invalid {property} property: {message}")]
    InvalidProperty {
        device: String,
        property: String,
        message: String,
    },
    #[error("device {device}: unhandled event type: {event_type}")]
    UnhandledEvent { device: String, event_type: u16 },
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
    #[error("failed to serialize reading: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    MiBeacon(#[from] MiBeaconError),
    #[error(transparent)]
    BtHome(#[from] BtHomeError),
    #[error(transparent)]
    Hvac(#[from] HvacError),
}

/// Builds one adapter instance from its configuration.
pub type Factory = fn(&DeviceConfig) -> Result<Box<dyn Device>, DeviceError>;

/// Maps configured device-type strings to adapter factories.
/// Lookup is case-insensitive; registering a type twice is an error.
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with every built-in adapter registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(lywsd03mmc::DEVICE_TYPE, lywsd03mmc::factory);
        for device_type in shelly::DEVICE_TYPES {
            registry.insert(device_type, shelly::factory);
        }
        registry.insert(p1p2::DEVICE_TYPE, p1p2::factory);
        registry.insert(passthrough::DEVICE_TYPE, passthrough::factory);
        registry
    }

    fn insert(&mut self, device_type: &str, factory: Factory) {
        self.factories.insert(device_type.to_lowercase(), factory);
    }

    pub fn register(&mut self, device_type: &str, factory: Factory) -> Result<(), DeviceError> {
        let key = device_type.to_lowercase();
        if self.factories.contains_key(&key) {
            return Err(DeviceError::AlreadyRegistered {
                device_type: device_type.to_string(),
            });
        }
        self.factories.insert(key, factory);
        Ok(())
    }

    pub fn create(&self, config: &DeviceConfig) -> Result<Box<dyn Device>, DeviceError> {
        let factory = self
            .factories
            .get(&config.device_type.to_lowercase())
            .ok_or_else(|| DeviceError::UnknownType {
                device_type: config.device_type.clone(),
            })?;
        factory(config)
    }

    /// Registered type keys, sorted; used for diagnostics.
    pub fn device_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }
}
