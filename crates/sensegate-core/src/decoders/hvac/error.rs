use thiserror::Error;

/// Errors returned by HVAC message parsing.
///
/// `UnknownDirection` is recoverable: plenty of bus traffic belongs to
/// other endpoints and callers are expected to skip it. A checksum
/// mismatch, by contrast, means the bytes were corrupted in transit and
/// is fatal for the message.
#[derive(Debug, Error)]
pub enum HvacError {
    #[error("message too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("malformed hex message: {0}")]
    MalformedHex(#[from] hex::FromHexError),
    #[error("unknown direction: {marker:#04x}")]
    UnknownDirection { marker: u8 },
    #[error("invalid checksum: computed {computed:#04x}, message carries {carried:#04x}")]
    InvalidChecksum { computed: u8, carried: u8 },
}
