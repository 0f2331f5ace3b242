//! MiBeacon BLE advertisement decoding.
//!
//! The parser unpacks the little-endian frame-control word, reads the
//! optional MAC address and capability byte the control bits announce,
//! decrypts the event region with AES-128-CCM when the encrypted bit is
//! set, and decodes one typed event. The bind key is resolved through a
//! caller-supplied [`BindKeyResolver`]; a frame whose key cannot be
//! resolved fails with the recoverable [`MiBeaconError::BindKeyRequired`].
//!
//! Multi-byte fields are little-endian throughout, except the MAC
//! address, which is byte-reversed from wire order into canonical display
//! order. Bit positions and the encryption slice geometry live in
//! `layout`; safe cursor reads live in `reader`.

pub mod error;
pub mod event;
pub mod key;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::MiBeaconError;
pub use event::Event;
pub use key::{BindKey, BindKeyResolver, InvalidKeyLength, ResolveError};
pub use parser::{CapabilityFlags, FrameControlFlags, MiBeaconFrame, decode};
