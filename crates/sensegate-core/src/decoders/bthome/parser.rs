use serde::Serialize;

use super::error::BtHomeError;
use super::layout;
use super::reader::TlvReader;

/// Capability flags derived from the header byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFlags {
    pub encryption: bool,
    pub trigger_based: bool,
    pub version: u8,
}

impl CapabilityFlags {
    fn from_header(header: u8) -> Self {
        Self {
            encryption: header & layout::ENCRYPTION_BIT != 0,
            trigger_based: header & layout::TRIGGER_BASED_BIT != 0,
            version: (header >> layout::VERSION_SHIFT) & layout::VERSION_MASK,
        }
    }
}

/// One decoded sensor reading.
///
/// The shape is fixed; which tags appeared in the stream is what varies.
/// Fields keep their zero-value defaults when the tag is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub capability_flags: CapabilityFlags,
    pub packet_id: u8,
    pub battery_percent: u8,
    pub illuminance_lux: f32,
    pub motion_state: u8,
    pub window_state: u8,
    pub humidity_percent: u8,
    pub button_event: u16,
    pub rotation_degrees: f32,
    pub temperature_celsius: f32,
}

/// Decode one compact-TLV advertisement into a reading.
///
/// Tags are consumed in stream order; a repeated tag overwrites the
/// earlier value (last write wins). An unknown tag or a short value read
/// fails the whole message.
pub fn decode(raw: &[u8]) -> Result<SensorReading, BtHomeError> {
    if raw.len() < layout::MIN_LEN {
        return Err(BtHomeError::TooShort {
            needed: layout::MIN_LEN,
            actual: raw.len(),
        });
    }

    let mut reader = TlvReader::new(raw);
    let capability_flags = CapabilityFlags::from_header(reader.read_u8()?);
    if capability_flags.version != layout::SUPPORTED_VERSION {
        return Err(BtHomeError::UnsupportedVersion {
            version: capability_flags.version,
        });
    }

    let mut reading = SensorReading {
        capability_flags,
        ..Default::default()
    };
    while let Some(tag) = reader.next_tag() {
        match tag {
            layout::PROP_PACKET_ID => reading.packet_id = reader.read_u8()?,
            layout::PROP_BATTERY => reading.battery_percent = reader.read_u8()?,
            layout::PROP_ILLUMINANCE => {
                reading.illuminance_lux = reader.read_u24_be()? as f32 / 100.0;
            }
            layout::PROP_MOTION => reading.motion_state = reader.read_u8()?,
            layout::PROP_WINDOW => reading.window_state = reader.read_u8()?,
            layout::PROP_HUMIDITY => reading.humidity_percent = reader.read_u8()?,
            layout::PROP_BUTTON => reading.button_event = reader.read_u16_be()?,
            layout::PROP_ROTATION => {
                reading.rotation_degrees = f32::from(reader.read_i16_be()?) / 10.0;
            }
            layout::PROP_TEMPERATURE => {
                reading.temperature_celsius = f32::from(reader.read_i16_be()?) / 10.0;
            }
            tag => return Err(BtHomeError::UnknownProperty { tag }),
        }
    }

    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::{CapabilityFlags, SensorReading, decode};
    use crate::decoders::bthome::error::BtHomeError;

    #[test]
    fn header_byte_0x44_unpacks_flags_and_version() {
        let reading = decode(&[0x44, 0x00, 0x00]).unwrap();
        assert_eq!(
            reading.capability_flags,
            CapabilityFlags {
                encryption: false,
                trigger_based: true,
                version: 2,
            }
        );
    }

    #[test]
    fn decode_full_advertisement() {
        let raw = [
            0x44, 0x00, 0x2b, 0x01, 0x64, 0x05, 0xdc, 0x05, 0x00, 0x2d, 0x00, 0x3f, 0x00, 0x00,
        ];
        let reading = decode(&raw).unwrap();
        assert_eq!(
            reading,
            SensorReading {
                capability_flags: CapabilityFlags {
                    encryption: false,
                    trigger_based: true,
                    version: 2,
                },
                packet_id: 43,
                battery_percent: 100,
                illuminance_lux: 144_192.0,
                window_state: 0,
                rotation_degrees: 0.0,
                ..Default::default()
            }
        );
    }

    #[test]
    fn decode_window_open_advertisement() {
        let raw = [
            0x44, 0x00, 0x2c, 0x01, 0x64, 0x05, 0x14, 0x05, 0x00, 0x2d, 0x01, 0x3f, 0x00, 0x00,
        ];
        let reading = decode(&raw).unwrap();
        assert_eq!(reading.packet_id, 44);
        assert_eq!(reading.illuminance_lux, 13_120.0);
        assert_eq!(reading.window_state, 1);
    }

    #[test]
    fn single_byte_is_too_short() {
        let err = decode(&[0x44]).unwrap_err();
        assert!(matches!(
            err,
            BtHomeError::TooShort {
                needed: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn version_1_header_is_unsupported() {
        let err = decode(&[0x20, 0x00, 0x00]).unwrap_err();
        match err {
            BtHomeError::UnsupportedVersion { version } => assert_eq!(version, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_tag_names_the_value() {
        let err = decode(&[0x44, 0x00, 0x00, 0x98, 0x00]).unwrap_err();
        match err {
            BtHomeError::UnknownProperty { tag } => assert_eq!(tag, 0x98),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_value_mid_field_is_an_error() {
        let err = decode(&[0x44, 0x00, 0x01, 0x45, 0x01]).unwrap_err();
        assert!(matches!(err, BtHomeError::TooShort { .. }));
    }

    #[test]
    fn repeated_tag_last_write_wins() {
        let raw = [0x44, 0x45, 0x00, 0xfb, 0x45, 0x01, 0x18];
        let reading = decode(&raw).unwrap();
        assert_eq!(reading.temperature_celsius, 28.0);
    }

    #[test]
    fn decode_is_idempotent() {
        let raw = [
            0x44, 0x00, 0x2b, 0x01, 0x64, 0x05, 0xdc, 0x05, 0x00, 0x2d, 0x00, 0x3f, 0x00, 0x00,
        ];
        assert_eq!(decode(&raw).unwrap(), decode(&raw).unwrap());
    }
}
