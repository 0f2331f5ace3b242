use std::fmt;

use thiserror::Error;

/// A 16-byte per-device secret used to decrypt encrypted frames.
///
/// The decoder never stores keys; it borrows one per call through a
/// [`BindKeyResolver`]. The `Debug` impl is redacted so keys do not leak
/// into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BindKey([u8; 16]);

impl BindKey {
    pub const LEN: usize = 16;

    pub fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Debug for BindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BindKey(..)")
    }
}

impl TryFrom<&[u8]> for BindKey {
    type Error = InvalidKeyLength;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::LEN] = bytes
            .try_into()
            .map_err(|_| InvalidKeyLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

#[derive(Debug, Error)]
#[error("invalid bind key length: need 16 bytes, got {0}")]
pub struct InvalidKeyLength(pub usize);

/// Error reported by a [`BindKeyResolver`] lookup.
///
/// Distinct from a missing key: a resolver that finds no key returns
/// `Ok(None)`, which the decoder maps to the recoverable
/// `BindKeyRequired`; a `ResolveError` is a hard failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResolveError {
    message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Caller-owned bind-key lookup, keyed by the canonical colon-separated
/// uppercase MAC address.
///
/// The decoder invokes the resolver synchronously, at most once per
/// frame, and never retains the key. Any closure with the matching
/// signature is a resolver:
///
/// ```
/// use sensegate_core::decoders::mibeacon::{BindKey, BindKeyResolver, ResolveError};
///
/// let resolver = |mac: &str| -> Result<Option<BindKey>, ResolveError> {
///     if mac == "A4:C1:38:13:89:A3" {
///         Ok(Some(BindKey::new([0u8; 16])))
///     } else {
///         Ok(None)
///     }
/// };
/// assert!(resolver.resolve("00:00:00:00:00:00").unwrap().is_none());
/// ```
pub trait BindKeyResolver {
    fn resolve(&self, mac: &str) -> Result<Option<BindKey>, ResolveError>;
}

impl<F> BindKeyResolver for F
where
    F: Fn(&str) -> Result<Option<BindKey>, ResolveError>,
{
    fn resolve(&self, mac: &str) -> Result<Option<BindKey>, ResolveError> {
        self(mac)
    }
}
