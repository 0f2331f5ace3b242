//! SenseGate core library: decoding for an IoT telemetry gateway.
//!
//! This crate implements the decoding pipeline used by the CLI and by
//! transport frontends: message sources feed device adapters, which drive
//! the protocol decoders (layout/reader/parser) and emit typed readings
//! plus a generic property bag. Decoding is byte-oriented and side-effect
//! free; all file I/O is isolated in `source` modules. Protocol
//! conventions are captured in readers so parsers stay minimal and
//! auditable against the wire formats.
//!
//! Invariants:
//! - Decoders are pure: a call either returns a fully constructed record
//!   or a classified error, with no partial state left behind.
//! - Decoders hold no state between calls and are safe to invoke
//!   concurrently; the only callback is bind-key resolution, owned by the
//!   caller.
//! - Device secrets (MAC addresses, encryption keys) arrive through
//!   configuration; decoders never store them.
//!
//! Version française (résumé):
//! Cette crate fournit le cœur de décodage de la passerelle : sources ->
//! adaptateurs d'appareils -> décodeurs de protocoles (layout/reader/
//! parser) -> mesures typées. Les décodeurs sont purs et sans E/S ; les
//! secrets restent côté configuration.
//!
//! # Examples
//! ```
//! use sensegate_core::decoders::bthome;
//!
//! let reading = bthome::decode(&[0x44, 0x00, 0x2b, 0x01, 0x64])?;
//! assert_eq!(reading.packet_id, 43);
//! assert_eq!(reading.battery_percent, 100);
//! # Ok::<(), sensegate_core::decoders::bthome::BtHomeError>(())
//! ```

use std::collections::BTreeMap;

pub mod decoders;
pub mod device;
pub mod source;

pub use device::{Device, DeviceConfig, DeviceError, Registry};
pub use source::{FileSource, Message, MessageSource, PayloadFormat, SourceError};

/// A raw or decoded message flowing through the gateway.
///
/// `payload` is the opaque message body; `properties` is the generic
/// key/value bag downstream collaborators (outputs, transforms) consume
/// without knowing decoder internals. Property keys use camelCase, as
/// emitted by the device adapters.
///
/// # Examples
/// ```
/// use sensegate_core::DeviceData;
///
/// let data = DeviceData::new(b"payload".to_vec());
/// assert!(data.properties.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceData {
    /// Opaque message body (raw bytes in, decoder output bytes out).
    pub payload: Vec<u8>,
    /// Generic property bag, stable key order.
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl DeviceData {
    /// Wrap a raw payload with an empty property bag.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            properties: BTreeMap::new(),
        }
    }

    /// Wrap a raw payload with initial properties.
    pub fn with_properties(
        payload: Vec<u8>,
        properties: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            payload,
            properties,
        }
    }
}
