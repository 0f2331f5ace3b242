use aes::Aes128;
use ccm::Ccm;
use ccm::aead::{Aead, KeyInit, Payload};
use generic_array::GenericArray;
use generic_array::typenum::{U4, U12};
use serde::Serialize;

use super::error::MiBeaconError;
use super::event::{self, Event};
use super::key::BindKeyResolver;
use super::layout;
use super::reader::FrameReader;

/// AES-128-CCM with a 4-byte authentication tag and a 12-byte nonce.
type FrameCipher = Ccm<Aes128, U4, U12>;

/// The ten independent flag bits of the frame-control word, recomputed
/// per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameControlFlags {
    pub is_factory_new: bool,
    pub is_connected: bool,
    pub is_central: bool,
    pub is_encrypted: bool,
    pub has_mac_address: bool,
    pub has_capabilities: bool,
    pub has_event: bool,
    pub has_custom_data: bool,
    pub has_subtitle: bool,
    pub has_binding: bool,
}

impl FrameControlFlags {
    fn from_word(word: u16) -> Self {
        Self {
            is_factory_new: word & layout::FC_IS_FACTORY_NEW != 0,
            is_connected: word & layout::FC_IS_CONNECTED != 0,
            is_central: word & layout::FC_IS_CENTRAL != 0,
            is_encrypted: word & layout::FC_IS_ENCRYPTED != 0,
            has_mac_address: word & layout::FC_HAS_MAC_ADDRESS != 0,
            has_capabilities: word & layout::FC_HAS_CAPABILITIES != 0,
            has_event: word & layout::FC_HAS_EVENT != 0,
            has_custom_data: word & layout::FC_HAS_CUSTOM_DATA != 0,
            has_subtitle: word & layout::FC_HAS_SUBTITLE != 0,
            has_binding: word & layout::FC_HAS_BINDING != 0,
        }
    }
}

/// Capability bits of the optional capability byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFlags {
    pub connectable: bool,
    pub central: bool,
    pub secure: bool,
    pub io: bool,
}

impl CapabilityFlags {
    fn from_byte(byte: u8) -> Self {
        Self {
            connectable: byte & layout::CAP_CONNECTABLE != 0,
            central: byte & layout::CAP_CENTRAL != 0,
            secure: byte & layout::CAP_SECURE != 0,
            io: byte & layout::CAP_IO != 0,
        }
    }
}

/// One decoded advertisement frame.
///
/// `mac_address` (lowercase hex, display order) and `capabilities` are
/// `Some` exactly when the corresponding frame-control bit was set.
/// `event_type` and `event_length` stay zero when the frame carries no
/// event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiBeaconFrame {
    pub frame_control: FrameControlFlags,
    pub version: u8,
    pub product_id: u16,
    pub frame_counter: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilityFlags>,
    pub event_type: u16,
    pub event_length: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

/// Decode one raw BLE manufacturer-data buffer into a frame.
///
/// The resolver is invoked at most once, with the canonical
/// colon-separated uppercase MAC address, and only for encrypted frames
/// that carry a MAC. An encrypted frame with no resolvable key fails
/// with the recoverable [`MiBeaconError::BindKeyRequired`].
pub fn decode(
    raw: &[u8],
    resolver: &impl BindKeyResolver,
) -> Result<MiBeaconFrame, MiBeaconError> {
    let mut reader = FrameReader::new(raw);

    let frame_control_word = reader.read_u16_le()?;
    let frame_control = FrameControlFlags::from_word(frame_control_word);
    let version = (frame_control_word >> layout::VERSION_SHIFT) as u8;
    let product_id = reader.read_u16_le()?;
    let frame_counter = reader.read_u8()?;

    let mac_address = if frame_control.has_mac_address {
        Some(hex::encode(reader.read_mac()?))
    } else {
        None
    };

    let capabilities = if frame_control.has_capabilities {
        Some(CapabilityFlags::from_byte(reader.read_u8()?))
    } else {
        None
    };

    let mut event_type = 0u16;
    let mut event_length = 0u8;
    let mut event = None;
    if frame_control.is_encrypted {
        let plaintext =
            decrypt_event_region(raw, &frame_control, mac_address.as_deref(), resolver)?;
        if frame_control.has_event {
            let mut event_reader = FrameReader::new(&plaintext);
            event_type = event_reader.read_u16_le()?;
            event_length = event_reader.read_u8()?;
            event = Some(event::parse_event(event_type, &mut event_reader)?);
        }
    } else if frame_control.has_event {
        event_type = reader.read_u16_le()?;
        event_length = reader.read_u8()?;
        event = Some(event::parse_event(event_type, &mut reader)?);
    }

    Ok(MiBeaconFrame {
        frame_control,
        version,
        product_id,
        frame_counter,
        mac_address,
        capabilities,
        event_type,
        event_length,
        event,
    })
}

fn decrypt_event_region(
    raw: &[u8],
    frame_control: &FrameControlFlags,
    mac_address: Option<&str>,
    resolver: &impl BindKeyResolver,
) -> Result<Vec<u8>, MiBeaconError> {
    let key = match mac_address {
        Some(mac) => resolver.resolve(&canonical_mac(mac))?,
        None => None,
    };
    let key = key.ok_or(MiBeaconError::BindKeyRequired)?;

    let mut event_offset = layout::HEADER_LEN;
    if frame_control.has_mac_address {
        event_offset += layout::MAC_LEN;
    }
    if frame_control.has_capabilities {
        event_offset += 1;
    }
    let needed = event_offset + layout::MIN_EVENT_REGION_LEN;
    if raw.len() < needed {
        return Err(MiBeaconError::TooShort {
            needed,
            actual: raw.len(),
        });
    }
    if raw.len() < layout::MIN_ENCRYPTED_LEN {
        return Err(MiBeaconError::TooShort {
            needed: layout::MIN_ENCRYPTED_LEN,
            actual: raw.len(),
        });
    }

    // Ciphertext is the payload region plus the 4-byte authentication
    // token at the tail; the 3 bytes in between are the counter.
    let counter_start = raw.len() - layout::AUTH_TAG_LEN - layout::COUNTER_LEN;
    let mut ciphertext =
        Vec::with_capacity(counter_start - layout::CIPHERTEXT_START + layout::AUTH_TAG_LEN);
    ciphertext.extend_from_slice(&raw[layout::CIPHERTEXT_START..counter_start]);
    ciphertext.extend_from_slice(&raw[raw.len() - layout::AUTH_TAG_LEN..]);

    let mut nonce = [0u8; layout::NONCE_LEN];
    nonce[..6].copy_from_slice(&raw[layout::NONCE_MAC_RANGE]);
    nonce[6..9].copy_from_slice(&raw[layout::NONCE_DEVICE_RANGE]);
    nonce[9..].copy_from_slice(&raw[counter_start..counter_start + layout::COUNTER_LEN]);

    let cipher = FrameCipher::new(GenericArray::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            GenericArray::from_slice(&nonce),
            Payload {
                msg: &ciphertext,
                aad: &layout::AAD,
            },
        )
        .map_err(|_| MiBeaconError::Decryption)
}

/// Format a 12-hex-digit MAC string as colon-separated uppercase pairs,
/// the form resolvers are keyed by.
fn canonical_mac(mac: &str) -> String {
    if mac.contains(':') {
        return mac.to_string();
    }
    let mut out = String::with_capacity(mac.len() + mac.len() / 2);
    for (i, chunk) in mac.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        for &byte in chunk {
            out.push(byte.to_ascii_uppercase() as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{CapabilityFlags, FrameControlFlags, canonical_mac, decode};
    use crate::decoders::mibeacon::error::MiBeaconError;
    use crate::decoders::mibeacon::event::Event;
    use crate::decoders::mibeacon::key::{BindKey, ResolveError};

    fn key_of(hex_key: &str) -> BindKey {
        BindKey::try_from(hex::decode(hex_key).unwrap().as_slice()).unwrap()
    }

    fn fixed_key(hex_key: &str) -> impl Fn(&str) -> Result<Option<BindKey>, ResolveError> {
        let key = key_of(hex_key);
        move |_mac: &str| Ok(Some(key.clone()))
    }

    fn no_key(_mac: &str) -> Result<Option<BindKey>, ResolveError> {
        Ok(None)
    }

    #[test]
    fn decode_encrypted_humidity_frame() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let frame = decode(&raw, &fixed_key("6badc40a09b9176765c76226f000d6cb")).unwrap();

        assert_eq!(
            frame.frame_control,
            FrameControlFlags {
                is_encrypted: true,
                has_mac_address: true,
                has_event: true,
                ..Default::default()
            }
        );
        assert_eq!(frame.version, 5);
        assert_eq!(frame.product_id, 1371);
        assert_eq!(frame.frame_counter, 31);
        assert_eq!(frame.mac_address.as_deref(), Some("a4c1381389a3"));
        assert_eq!(frame.capabilities, None);
        assert_eq!(frame.event_type, 4102);
        assert_eq!(frame.event_length, 2);
        assert_eq!(frame.event, Some(Event::Humidity { percent: 30.8 }));
    }

    #[test]
    fn decode_encrypted_temperature_frame() {
        let raw = hex::decode("58585b05a4d8913838c1a4c2e0b504e004000047a2894a").unwrap();
        let frame = decode(&raw, &fixed_key("e8009ec45eec9e46922c938daf22bfc4")).unwrap();

        assert_eq!(frame.frame_counter, 164);
        assert_eq!(frame.mac_address.as_deref(), Some("a4c1383891d8"));
        assert_eq!(frame.event_type, 4100);
        assert_eq!(frame.event, Some(Event::Temperature { celsius: 25.6 }));
    }

    #[test]
    fn decode_encrypted_battery_frame() {
        let raw = hex::decode("58585b05a5d8913838c1a4f663838b040000875a963d").unwrap();
        let frame = decode(&raw, &fixed_key("e8009ec45eec9e46922c938daf22bfc4")).unwrap();

        assert_eq!(frame.frame_counter, 165);
        assert_eq!(frame.event_type, 4106);
        assert_eq!(frame.event_length, 1);
        assert_eq!(frame.event, Some(Event::Battery { percent: 100 }));
    }

    #[test]
    fn decode_capability_frame_without_event() {
        // Unencrypted, so the resolver must never run.
        let raw = hex::decode("30585b0558a3891338c1a408").unwrap();
        let resolver =
            |_mac: &str| -> Result<Option<BindKey>, ResolveError> {
                Err(ResolveError::new("resolver must not be called"))
            };
        let frame = decode(&raw, &resolver).unwrap();

        assert_eq!(frame.version, 5);
        assert_eq!(frame.frame_counter, 88);
        assert_eq!(frame.mac_address.as_deref(), Some("a4c1381389a3"));
        assert_eq!(
            frame.capabilities,
            Some(CapabilityFlags {
                io: true,
                ..Default::default()
            })
        );
        assert_eq!(frame.event_type, 0);
        assert_eq!(frame.event_length, 0);
        assert_eq!(frame.event, None);
    }

    #[test]
    fn missing_bind_key_is_recoverable() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let err = decode(&raw, &no_key).unwrap_err();
        assert!(matches!(err, MiBeaconError::BindKeyRequired));
    }

    #[test]
    fn resolver_receives_canonical_mac() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let seen = RefCell::new(None);
        let resolver = |mac: &str| -> Result<Option<BindKey>, ResolveError> {
            *seen.borrow_mut() = Some(mac.to_string());
            Ok(Some(key_of("6badc40a09b9176765c76226f000d6cb")))
        };
        decode(&raw, &resolver).unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("A4:C1:38:13:89:A3"));
    }

    #[test]
    fn resolver_error_is_a_hard_failure() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let resolver = |_mac: &str| -> Result<Option<BindKey>, ResolveError> {
            Err(ResolveError::new("key store unavailable"))
        };
        let err = decode(&raw, &resolver).unwrap_err();
        assert!(matches!(err, MiBeaconError::KeyResolution(_)));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let err = decode(&raw, &fixed_key("e8009ec45eec9e46922c938daf22bfc4")).unwrap_err();
        assert!(matches!(err, MiBeaconError::Decryption));
    }

    #[test]
    fn frame_without_event_bit_parses_nothing() {
        // Frame control 0x5000: version 5, every content bit clear.
        let raw = [0x00, 0x50, 0x5b, 0x05, 0x01];
        let frame = decode(&raw, &no_key).unwrap();
        assert_eq!(frame.mac_address, None);
        assert_eq!(frame.capabilities, None);
        assert_eq!(frame.event, None);
        assert_eq!(frame.event_type, 0);
    }

    #[test]
    fn unknown_event_type_names_the_code() {
        // Frame control 0x5040: version 5, has-event only. Event type 255.
        let raw = [0x40, 0x50, 0x5b, 0x05, 0x01, 0xff, 0x00, 0x01, 0x00];
        let err = decode(&raw, &no_key).unwrap_err();
        match err {
            MiBeaconError::UnknownEventType { event_type } => assert_eq!(event_type, 255),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn truncated_event_payload_is_too_short() {
        // Temperature event (4100 = 0x1004) with a one-byte payload.
        let raw = [0x40, 0x50, 0x5b, 0x05, 0x01, 0x04, 0x10, 0x02, 0x34];
        let err = decode(&raw, &no_key).unwrap_err();
        assert!(matches!(err, MiBeaconError::TooShort { .. }));
    }

    #[test]
    fn short_header_is_too_short() {
        let err = decode(&[0x30], &no_key).unwrap_err();
        assert!(matches!(
            err,
            MiBeaconError::TooShort {
                needed: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn decode_is_idempotent() {
        let raw = hex::decode("58585b051fa3891338c1a4f30a68073c000000f7058be5").unwrap();
        let resolver = fixed_key("6badc40a09b9176765c76226f000d6cb");
        let first = decode(&raw, &resolver).unwrap();
        let second = decode(&raw, &resolver).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn canonical_mac_formats_uppercase_pairs() {
        assert_eq!(canonical_mac("a4c1381389a3"), "A4:C1:38:13:89:A3");
        assert_eq!(canonical_mac("A4:C1:38:13:89:A3"), "A4:C1:38:13:89:A3");
    }
}
