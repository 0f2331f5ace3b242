// Header byte: encryption bit, trigger-based bit, 3-bit version field.
pub const ENCRYPTION_BIT: u8 = 1 << 0;
pub const TRIGGER_BASED_BIT: u8 = 1 << 2;
pub const VERSION_SHIFT: u32 = 5;
pub const VERSION_MASK: u8 = (1 << 3) - 1;
pub const SUPPORTED_VERSION: u8 = 2;

pub const MIN_LEN: usize = 3;

// Property tags; the value width is implied by the tag.
pub const PROP_PACKET_ID: u8 = 0x00;
pub const PROP_BATTERY: u8 = 0x01;
pub const PROP_ILLUMINANCE: u8 = 0x05;
pub const PROP_MOTION: u8 = 0x21;
pub const PROP_WINDOW: u8 = 0x2d;
pub const PROP_HUMIDITY: u8 = 0x2e;
pub const PROP_BUTTON: u8 = 0x3a;
pub const PROP_ROTATION: u8 = 0x3f;
pub const PROP_TEMPERATURE: u8 = 0x45;
