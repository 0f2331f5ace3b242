//! Sensor protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, bit masks and wire constants (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Decoders are pure and contain no I/O: bytes in, a typed record or a
//! classified error out. Device adapters and sources handle transport
//! access and dispatch.

pub mod bthome;
pub mod hvac;
pub mod mibeacon;
