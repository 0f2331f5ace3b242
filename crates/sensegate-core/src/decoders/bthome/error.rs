use thiserror::Error;

/// Errors returned by compact-TLV parsing. All are fatal for the
/// offending message.
#[derive(Debug, Error)]
pub enum BtHomeError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unsupported format version: {version}")]
    UnsupportedVersion { version: u8 },
    #[error("unknown property tag: {tag:#04x}")]
    UnknownProperty { tag: u8 },
}
