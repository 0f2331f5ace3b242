use thiserror::Error;

use super::key::ResolveError;

/// Errors returned by MiBeacon parsing and decryption.
///
/// `BindKeyRequired` is the one recoverable condition: the frame is
/// encrypted and no key is resolvable for its MAC address. Callers are
/// expected to skip the message rather than treat it as a failure. Every
/// other variant is fatal for the offending message only.
#[derive(Debug, Error)]
pub enum MiBeaconError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("bind key required")]
    BindKeyRequired,
    #[error("key resolution failed: {0}")]
    KeyResolution(#[from] ResolveError),
    #[error("decryption failed: ciphertext authentication error")]
    Decryption,
    #[error("unknown event type: {event_type}")]
    UnknownEventType { event_type: u16 },
}
