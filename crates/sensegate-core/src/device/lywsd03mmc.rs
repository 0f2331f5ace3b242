use serde_json::json;

use super::{Device, DeviceConfig, DeviceError};
use crate::DeviceData;
use crate::decoders::mibeacon::{self, BindKey, Event, MiBeaconError, ResolveError};

pub(crate) const DEVICE_TYPE: &str = "LYWSD03MMC";

const MAC_ADDRESS_PROPERTY: &str = "macAddress";
const ENCRYPTION_KEY_PROPERTY: &str = "encryptionKey";

/// Xiaomi LYWSD03MMC temperature/humidity sensor: MiBeacon frames
/// encrypted with a per-device bind key. The adapter resolves the key
/// only for its own MAC address, so advertisements from other sensors
/// are skipped instead of failing decryption.
struct Lywsd03mmc {
    name: String,
    mac_address: String,
    bind_key: BindKey,
}

pub(crate) fn factory(config: &DeviceConfig) -> Result<Box<dyn Device>, DeviceError> {
    let mac_value = config.require_property(MAC_ADDRESS_PROPERTY)?;
    let mac_address =
        normalize_mac(mac_value).ok_or_else(|| DeviceError::InvalidProperty {
            device: config.name.clone(),
            property: MAC_ADDRESS_PROPERTY.to_string(),
            message: format!("not a MAC address: {mac_value}"),
        })?;

    let key_value = config.require_property(ENCRYPTION_KEY_PROPERTY)?;
    let key_bytes = hex::decode(key_value).map_err(|err| DeviceError::InvalidProperty {
        device: config.name.clone(),
        property: ENCRYPTION_KEY_PROPERTY.to_string(),
        message: err.to_string(),
    })?;
    let bind_key =
        BindKey::try_from(key_bytes.as_slice()).map_err(|err| DeviceError::InvalidProperty {
            device: config.name.clone(),
            property: ENCRYPTION_KEY_PROPERTY.to_string(),
            message: err.to_string(),
        })?;

    Ok(Box::new(Lywsd03mmc {
        name: config.name.clone(),
        mac_address,
        bind_key,
    }))
}

impl Device for Lywsd03mmc {
    fn decode(&self, data: &DeviceData) -> Result<Option<DeviceData>, DeviceError> {
        let resolver = |mac: &str| -> Result<Option<BindKey>, ResolveError> {
            if self.mac_address.eq_ignore_ascii_case(mac) {
                Ok(Some(self.bind_key.clone()))
            } else {
                Ok(None)
            }
        };

        let frame = match mibeacon::decode(&data.payload, &resolver) {
            Ok(frame) => frame,
            Err(MiBeaconError::BindKeyRequired) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let (unit, value) = match frame.event {
            Some(Event::Temperature { celsius }) => ("Temperature", format!("{celsius:.2}")),
            Some(Event::Humidity { percent }) => ("Humidity", format!("{percent:.2}")),
            Some(Event::Battery { percent }) => ("Battery", percent.to_string()),
            None => return Ok(None),
            Some(_) => {
                return Err(DeviceError::UnhandledEvent {
                    device: self.name.clone(),
                    event_type: frame.event_type,
                });
            }
        };

        let mut result = DeviceData::new(value.clone().into_bytes());
        result
            .properties
            .insert("deviceName".to_string(), json!(self.name));
        result
            .properties
            .insert("deviceType".to_string(), json!(DEVICE_TYPE));
        result
            .properties
            .insert("deviceMacAddress".to_string(), json!(self.mac_address));
        result.properties.insert("unit".to_string(), json!(unit));
        result.properties.insert("value".to_string(), json!(value));
        Ok(Some(result))
    }
}

/// Accept `AA:BB:CC:DD:EE:FF`, dash-separated, or bare 12-digit forms;
/// normalize to the canonical colon-separated uppercase form the
/// resolver compares against.
fn normalize_mac(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(|c| *c != ':' && *c != '-').collect();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let mut out = String::with_capacity(17);
    for (i, chunk) in digits.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        for &byte in chunk {
            out.push(byte.to_ascii_uppercase() as char);
        }
    }
    Some(out)
}
