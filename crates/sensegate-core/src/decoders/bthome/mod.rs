//! Compact single-byte-tag TLV sensor decoding (BTHome style).
//!
//! One header byte carries the capability flags and the 3-bit format
//! version (only version 2 is accepted), followed by a flat sequence of
//! tagged fields consumed in order until the buffer is exhausted. Field
//! width is implied by the tag; multi-byte values are big-endian. The
//! reading record has a fixed shape: tags absent from the stream leave
//! zero-value defaults, and a repeated tag overwrites the earlier value.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::BtHomeError;
pub use parser::{CapabilityFlags, SensorReading, decode};
