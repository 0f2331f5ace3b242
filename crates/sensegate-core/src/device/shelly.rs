use serde_json::json;

use super::{Device, DeviceConfig, DeviceError};
use crate::DeviceData;
use crate::decoders::bthome;

/// Shelly BLU family models advertising compact-TLV sensor data. They
/// all share one adapter; the registered type name is only metadata.
pub(crate) const DEVICE_TYPES: [&str; 5] = [
    "SBBT-002C",
    "SBBT-004CEU",
    "SBDW-002C",
    "SBHT-003C",
    "SBMO-003Z",
];

struct ShellyBtDevice {
    name: String,
    device_type: String,
}

pub(crate) fn factory(config: &DeviceConfig) -> Result<Box<dyn Device>, DeviceError> {
    Ok(Box::new(ShellyBtDevice {
        name: config.name.clone(),
        device_type: config.device_type.clone(),
    }))
}

impl Device for ShellyBtDevice {
    fn decode(&self, data: &DeviceData) -> Result<Option<DeviceData>, DeviceError> {
        let reading = bthome::decode(&data.payload)?;
        let payload = serde_json::to_vec(&reading)?;

        let mut properties = data.properties.clone();
        properties.insert("deviceName".to_string(), json!(self.name));
        properties.insert("deviceType".to_string(), json!(self.device_type));
        properties.insert(
            "batteryPercent".to_string(),
            json!(reading.battery_percent),
        );
        properties.insert(
            "illuminanceLux".to_string(),
            json!(reading.illuminance_lux),
        );
        properties.insert("motionState".to_string(), json!(reading.motion_state));
        properties.insert("windowState".to_string(), json!(reading.window_state));
        properties.insert(
            "humidityPercent".to_string(),
            json!(reading.humidity_percent),
        );
        properties.insert("buttonEvent".to_string(), json!(reading.button_event));
        properties.insert(
            "rotationDegrees".to_string(),
            json!(reading.rotation_degrees),
        );
        properties.insert(
            "temperatureCelsius".to_string(),
            json!(reading.temperature_celsius),
        );

        Ok(Some(DeviceData::with_properties(payload, properties)))
    }
}
