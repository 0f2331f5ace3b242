// Frame-control bits of the leading little-endian u16; the upper nibble
// carries the protocol version.
pub const FC_IS_FACTORY_NEW: u16 = 1 << 0;
pub const FC_IS_CONNECTED: u16 = 1 << 1;
pub const FC_IS_CENTRAL: u16 = 1 << 2;
pub const FC_IS_ENCRYPTED: u16 = 1 << 3;
pub const FC_HAS_MAC_ADDRESS: u16 = 1 << 4;
pub const FC_HAS_CAPABILITIES: u16 = 1 << 5;
pub const FC_HAS_EVENT: u16 = 1 << 6;
pub const FC_HAS_CUSTOM_DATA: u16 = 1 << 7;
pub const FC_HAS_SUBTITLE: u16 = 1 << 8;
pub const FC_HAS_BINDING: u16 = 1 << 9;
pub const VERSION_SHIFT: u32 = 12;

pub const CAP_CONNECTABLE: u8 = 1 << 0;
pub const CAP_CENTRAL: u8 = 1 << 1;
pub const CAP_SECURE: u8 = 1 << 2;
pub const CAP_IO: u8 = 1 << 3;

pub const MAC_LEN: usize = 6;
pub const HEADER_LEN: usize = 5;

// Encrypted frames are sliced out of the raw advertisement, not the
// cursor stream: ciphertext = raw[11 .. len-7] ++ raw[len-4 ..], nonce =
// wire-order MAC ++ device type/counter bytes ++ 3-byte counter tail.
pub const CIPHERTEXT_START: usize = 11;
pub const NONCE_MAC_RANGE: std::ops::Range<usize> = 5..11;
pub const NONCE_DEVICE_RANGE: std::ops::Range<usize> = 2..5;
pub const COUNTER_LEN: usize = 3;
pub const AUTH_TAG_LEN: usize = 4;
pub const NONCE_LEN: usize = 12;
pub const AAD: [u8; 1] = [0x11];
pub const MIN_ENCRYPTED_LEN: usize = CIPHERTEXT_START + COUNTER_LEN + AUTH_TAG_LEN;
pub const MIN_EVENT_REGION_LEN: usize = 3;

// Event type codes (u16, little-endian on the wire).
pub const EVENT_TEMPERATURE: u16 = 4100;
pub const EVENT_HUMIDITY: u16 = 4102;
pub const EVENT_ILLUMINANCE: u16 = 4103;
pub const EVENT_MOISTURE: u16 = 4104;
pub const EVENT_FERTILITY: u16 = 4105;
pub const EVENT_BATTERY: u16 = 4106;
pub const EVENT_TEMPERATURE_AND_HUMIDITY: u16 = 4109;
